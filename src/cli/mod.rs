//! Command-line front end

pub mod commands;
pub mod prompt;

pub use prompt::{ConsoleNotifier, TerminalSecretPrompt};
