//! Error types for the send form

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the send form
#[derive(Error, Debug)]
pub enum Error {
    // Wallet errors
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("No wallet selected")]
    NoWalletSelected,

    #[error("Address {0} is not a spendable address of the selected wallet")]
    UnknownAddress(String),

    // Destination list errors
    #[error("Destination index {index} out of range (list has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot remove the last destination")]
    LastDestination,

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    // Hours policy errors
    #[error("Invalid share factor: {0}")]
    InvalidShareFactor(String),

    // Node errors
    #[error("HTTP error: {0}")]
    Http(String),

    // Wallet registry errors
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}
