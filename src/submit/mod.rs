//! Transaction submission
//!
//! Turns a valid [`crate::form::SendForm`] into a transaction request,
//! collecting the wallet secret when needed, and reports the outcome to the
//! host through a [`FormSubmitted`] event or a user-visible notification.

pub mod coordinator;
pub mod errors;
pub mod services;
pub mod transaction;

pub use coordinator::{
    FormSubmitted, SkipReason, SubmissionCoordinator, SubmitOutcome, SubmitSettings, SubmitState,
};
pub use errors::parse_response_message;
pub use services::{
    BuildError, NotificationSink, SecretPrompt, TransactionBuilder, TransactionRequest,
};
pub use transaction::{Transaction, TransactionInput, TransactionOutput};
