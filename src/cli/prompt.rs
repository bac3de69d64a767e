//! Terminal implementations of the submission collaborators

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dialoguer::Password;
use tracing::{debug, warn};

use crate::submit::services::{NotificationSink, SecretPrompt};

/// Reads the wallet password from the terminal
///
/// An empty entry or an interrupted prompt counts as a dismissal.
pub struct TerminalSecretPrompt {
    prompt: String,
}

impl TerminalSecretPrompt {
    pub fn new(wallet_label: &str) -> Self {
        Self {
            prompt: format!("Password for {} (empty to cancel)", wallet_label),
        }
    }
}

#[async_trait]
impl SecretPrompt for TerminalSecretPrompt {
    async fn request_secret(&self) -> Option<String> {
        let prompt = self.prompt.clone();

        let entered = tokio::task::spawn_blocking(move || {
            Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        })
        .await;

        match entered {
            Ok(Ok(secret)) if !secret.is_empty() => Some(secret),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!("Password prompt failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Password prompt task failed: {}", e);
                None
            }
        }
    }
}

/// Prints notifications to stderr
#[derive(Default)]
pub struct ConsoleNotifier {
    visible: AtomicBool,
}

impl NotificationSink for ConsoleNotifier {
    fn show(&self, message: &str, duration: Duration) {
        self.visible.store(true, Ordering::SeqCst);
        debug!("Showing notification for {}s", duration.as_secs());
        eprintln!("\n!! {}\n", message);
    }

    fn dismiss(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            debug!("Notification dismissed");
        }
    }
}
