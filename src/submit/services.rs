//! Collaborators the submission coordinator depends on
//!
//! These are implemented by the host: the CLI provides terminal versions,
//! tests provide in-memory ones, and [`crate::node`] provides the HTTP
//! transaction builder.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::form::{DestinationPayload, HoursSelection};
use crate::wallet::types::Wallet;

use super::transaction::Transaction;

/// Everything the transaction service needs to build a transaction
#[derive(Clone, Serialize)]
pub struct TransactionRequest {
    pub wallet: Wallet,
    /// Source address identifiers
    pub addresses: Vec<String>,
    /// Destinations in form order
    pub destinations: Vec<DestinationPayload>,
    pub hours_selection: HoursSelection,
    pub change_address: Option<String>,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
}

impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("wallet", &self.wallet.id)
            .field("addresses", &self.addresses)
            .field("destinations", &self.destinations)
            .field("hours_selection", &self.hours_selection)
            .field("change_address", &self.change_address)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Structured failure from the transaction service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
    /// Raw error body
    pub body: String,
}

impl BuildError {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Failure that never reached the service (connection refused, timeout)
    pub fn transport(body: impl Into<String>) -> Self {
        Self::new(None, body)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.body),
            None => write!(f, "{}", self.body),
        }
    }
}

impl std::error::Error for BuildError {}

/// Builds (and signs, when given a secret) transactions
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> std::result::Result<Transaction, BuildError>;
}

/// Collects the wallet secret from the user
#[async_trait]
pub trait SecretPrompt: Send + Sync {
    /// Ask for the secret; `None` means the user dismissed the prompt
    async fn request_secret(&self) -> Option<String>;

    /// Close the prompt once its secret has been taken
    fn close(&self) {}
}

/// Displays dismissible messages to the user
pub trait NotificationSink: Send + Sync {
    fn show(&self, message: &str, duration: Duration);

    fn dismiss(&self);
}
