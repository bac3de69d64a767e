//! Skycoin-style Advanced Send Library
//!
//! Source address selection, destination allocation, coin-hour policy and
//! transaction submission for a wallet's advanced send form.

pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod node;
pub mod submit;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use form::{SendForm, ValidationResult};
pub use submit::{FormSubmitted, SubmissionCoordinator, SubmitOutcome};
