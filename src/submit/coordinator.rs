//! Submission coordinator
//!
//! Drives one form submission from validation gate to result:
//!
//! ```text
//! submit ─► gate (valid? idle?) ─► dismiss + Loading ─► [secret prompt] ─► build
//!                                                            │              │
//!                                                       cancelled      ok / error
//!                                                            ▼              ▼
//!                                                          Idle    FormSubmitted / Error(msg)
//! ```
//!
//! At most one submission is in flight per coordinator; the submit-control
//! state doubles as the loading flag.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::form::{FormSnapshot, SendForm};

use super::errors::parse_response_message;
use super::services::{
    BuildError, NotificationSink, SecretPrompt, TransactionBuilder, TransactionRequest,
};
use super::transaction::Transaction;

/// How long submission errors stay on screen
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(300);

/// State of the submit control
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Loading,
    /// Last submission failed with this message
    Error(String),
}

impl SubmitState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmitState::Loading)
    }
}

/// Emitted to the host when a transaction was built
#[derive(Debug, Clone, Serialize)]
pub struct FormSubmitted {
    pub form: FormSnapshot,
    /// Total coins sent to destinations
    pub amount: f64,
    /// Recipient addresses in destination order
    pub to: Vec<String>,
    pub transaction: Transaction,
    pub submitted_at: DateTime<Utc>,
}

/// Why a submit request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Form is invalid or has no selection
    InvalidForm,
    /// A submission is already running
    InFlight,
    /// Coordinator was disposed
    Disposed,
}

/// Result of a submit request
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Skipped(SkipReason),
    /// User dismissed the secret prompt
    Cancelled,
    Submitted(FormSubmitted),
    /// Transaction service failed; message was shown to the user
    Failed(String),
}

/// Tunables for submission
#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub notification_duration: Duration,
    /// Upper bound on the build call; `None` waits indefinitely
    pub build_timeout: Option<Duration>,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            build_timeout: None,
        }
    }
}

/// Coordinates validation gating, secret collection and transaction building
pub struct SubmissionCoordinator<B, P, N> {
    builder: B,
    prompt: P,
    notifier: N,
    settings: SubmitSettings,
    state: RwLock<SubmitState>,
    events: RwLock<Option<mpsc::UnboundedSender<FormSubmitted>>>,
}

impl<B, P, N> SubmissionCoordinator<B, P, N>
where
    B: TransactionBuilder,
    P: SecretPrompt,
    N: NotificationSink,
{
    /// Create a coordinator and the receiver its `FormSubmitted` events go to
    pub fn new(
        builder: B,
        prompt: P,
        notifier: N,
        settings: SubmitSettings,
    ) -> (Self, mpsc::UnboundedReceiver<FormSubmitted>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let coordinator = Self {
            builder,
            prompt,
            notifier,
            settings,
            state: RwLock::new(SubmitState::Idle),
            events: RwLock::new(Some(sender)),
        };
        (coordinator, receiver)
    }

    /// Current submit-control state
    pub async fn state(&self) -> SubmitState {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading()
    }

    /// Submit the form
    pub async fn submit(&self, form: &SendForm) -> Result<SubmitOutcome> {
        if !form.is_valid() {
            debug!(validation = %form.validation(), "Submit ignored, form not valid");
            return Ok(SubmitOutcome::Skipped(SkipReason::InvalidForm));
        }

        let snapshot = form.snapshot()?;

        {
            let mut state = self.state.write().await;
            if state.is_loading() {
                debug!("Submit ignored, submission already in flight");
                return Ok(SubmitOutcome::Skipped(SkipReason::InFlight));
            }
            if self.events.read().await.is_none() {
                return Ok(SubmitOutcome::Skipped(SkipReason::Disposed));
            }

            self.notifier.dismiss();
            *state = SubmitState::Loading;
        }

        let secret = if snapshot.wallet.encrypted {
            match self.prompt.request_secret().await {
                Some(secret) => {
                    self.prompt.close();
                    Some(secret)
                }
                None => {
                    info!("Secret prompt dismissed, submission cancelled");
                    *self.state.write().await = SubmitState::Idle;
                    return Ok(SubmitOutcome::Cancelled);
                }
            }
        } else {
            None
        };

        let request = TransactionRequest {
            wallet: snapshot.wallet.clone(),
            addresses: snapshot
                .addresses
                .iter()
                .map(|a| a.address.clone())
                .collect(),
            destinations: snapshot.destinations.clone(),
            hours_selection: snapshot.hours_selection.clone(),
            change_address: form.change_address_opt(),
            secret,
        };

        info!(
            wallet = %request.wallet.id,
            destinations = request.destinations.len(),
            "Requesting transaction"
        );

        match self.build(&request).await {
            Ok(transaction) => {
                *self.state.write().await = SubmitState::Idle;

                let event = FormSubmitted {
                    amount: form.destinations().total_coins(),
                    to: form.destinations().recipients(),
                    form: snapshot,
                    transaction,
                    submitted_at: Utc::now(),
                };

                info!(
                    txid = %event.transaction.txid,
                    amount = event.amount,
                    "Transaction built"
                );

                match self.events.read().await.as_ref() {
                    Some(sender) => {
                        if sender.send(event.clone()).is_err() {
                            warn!("Submission receiver dropped, event not delivered");
                        }
                    }
                    None => warn!("Coordinator disposed during submission, event not delivered"),
                }

                Ok(SubmitOutcome::Submitted(event))
            }
            Err(e) => {
                let message = parse_response_message(&e.body);
                error!(status = ?e.status, "Transaction build failed: {}", message);

                self.notifier
                    .show(&message, self.settings.notification_duration);
                *self.state.write().await = SubmitState::Error(message.clone());

                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    async fn build(
        &self,
        request: &TransactionRequest,
    ) -> std::result::Result<Transaction, BuildError> {
        match self.settings.build_timeout {
            Some(limit) => tokio::time::timeout(limit, self.builder.create_transaction(request))
                .await
                .unwrap_or_else(|_| {
                    Err(BuildError::transport(format!(
                        "Transaction build timed out after {}ms",
                        limit.as_millis()
                    )))
                }),
            None => self.builder.create_transaction(request).await,
        }
    }

    /// Tear down: dismiss any notification and stop emitting events
    pub async fn dispose(&self) {
        self.notifier.dismiss();
        if self.events.write().await.take().is_some() {
            debug!("Submission coordinator disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::form::Destination;
    use crate::submit::transaction::TransactionOutput;
    use crate::wallet::types::{Address, Wallet};

    #[derive(Default)]
    struct FakeBuilder {
        requests: Mutex<Vec<TransactionRequest>>,
        fail_with: Option<BuildError>,
        gate: Option<Arc<Notify>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl TransactionBuilder for FakeBuilder {
        async fn create_transaction(
            &self,
            request: &TransactionRequest,
        ) -> std::result::Result<Transaction, BuildError> {
            self.requests.lock().unwrap().push(request.clone());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }

            Ok(Transaction {
                txid: "f00d".to_string(),
                inner_hash: String::new(),
                fee: "1".to_string(),
                inputs: vec![],
                outputs: request
                    .destinations
                    .iter()
                    .map(|d| TransactionOutput {
                        uxid: String::new(),
                        address: d.address.clone(),
                        coins: d.coins.clone(),
                        hours: d.hours.clone().unwrap_or_default(),
                    })
                    .collect(),
                encoded: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct FakePrompt {
        secret: Option<String>,
        asked: AtomicUsize,
        closed: AtomicUsize,
    }

    #[async_trait]
    impl SecretPrompt for FakePrompt {
        async fn request_secret(&self) -> Option<String> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.secret.clone()
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        shown: Mutex<Vec<(String, Duration)>>,
        dismissed: AtomicUsize,
    }

    impl NotificationSink for FakeNotifier {
        fn show(&self, message: &str, duration: Duration) {
            self.shown.lock().unwrap().push((message.to_string(), duration));
        }

        fn dismiss(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn wallet(encrypted: bool) -> Wallet {
        Wallet {
            id: "main.wlt".to_string(),
            label: "Main".to_string(),
            encrypted,
            addresses: vec![Address::new("src", 10.0, 100)],
        }
    }

    fn valid_form(encrypted: bool) -> SendForm {
        let mut form = SendForm::new();
        form.set_wallet(wallet(encrypted));
        form.select_addresses(&["src"]).unwrap();
        form.set_destination(0, Destination::new("X", "2", "10")).unwrap();
        form.add_destination();
        form.set_destination(1, Destination::new("Y", "1.5", "5")).unwrap();
        form
    }

    type Coordinator = SubmissionCoordinator<FakeBuilder, FakePrompt, FakeNotifier>;

    fn coordinator(
        builder: FakeBuilder,
        prompt: FakePrompt,
    ) -> (Coordinator, mpsc::UnboundedReceiver<FormSubmitted>) {
        SubmissionCoordinator::new(
            builder,
            prompt,
            FakeNotifier::default(),
            SubmitSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_form_is_skipped() {
        let (coordinator, _rx) = coordinator(FakeBuilder::default(), FakePrompt::default());

        let outcome = coordinator.submit(&SendForm::new()).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Skipped(SkipReason::InvalidForm)
        ));
        assert!(coordinator.builder.requests.lock().unwrap().is_empty());
        assert_eq!(coordinator.notifier.dismissed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_submission_emits_event() {
        let (coordinator, mut rx) = coordinator(FakeBuilder::default(), FakePrompt::default());
        let mut form = valid_form(false);
        form.set_change_address("  ");

        let outcome = coordinator.submit(&form).await.unwrap();
        let event = match outcome {
            SubmitOutcome::Submitted(event) => event,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(event.amount, 3.5);
        assert_eq!(event.to, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(event.transaction.txid, "f00d");
        assert_eq!(coordinator.state().await, SubmitState::Idle);
        assert_eq!(coordinator.notifier.dismissed.load(Ordering::SeqCst), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.to, event.to);

        let requests = coordinator.builder.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.addresses, vec!["src".to_string()]);
        assert_eq!(request.change_address, None);
        assert!(request.secret.is_none());
        assert!(request.hours_selection.is_auto());
        assert!(request.destinations.iter().all(|d| d.hours.is_none()));
        assert_eq!(coordinator.prompt.asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_manual_hours_transmitted() {
        let (coordinator, _rx) = coordinator(FakeBuilder::default(), FakePrompt::default());
        let mut form = valid_form(false);
        form.set_auto_hours(false);
        form.set_change_address("chg");

        let outcome = coordinator.submit(&form).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));

        let requests = coordinator.builder.requests.lock().unwrap();
        assert_eq!(requests[0].destinations[0].hours.as_deref(), Some("10"));
        assert_eq!(requests[0].change_address.as_deref(), Some("chg"));
    }

    #[tokio::test]
    async fn test_encrypted_wallet_uses_secret() {
        let prompt = FakePrompt {
            secret: Some("pw".to_string()),
            ..Default::default()
        };
        let (coordinator, _rx) = coordinator(FakeBuilder::default(), prompt);

        let outcome = coordinator.submit(&valid_form(true)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert_eq!(coordinator.prompt.closed.load(Ordering::SeqCst), 1);

        let requests = coordinator.builder.requests.lock().unwrap();
        assert_eq!(requests[0].secret.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_returns_to_idle() {
        let (coordinator, mut rx) = coordinator(FakeBuilder::default(), FakePrompt::default());

        let outcome = coordinator.submit(&valid_form(true)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Cancelled));
        assert_eq!(coordinator.state().await, SubmitState::Idle);
        assert!(coordinator.builder.requests.lock().unwrap().is_empty());
        assert!(coordinator.notifier.shown.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_shows_notification() {
        let builder = FakeBuilder {
            fail_with: Some(BuildError::new(
                Some(400),
                "400 Bad Request - balance is not sufficient",
            )),
            ..Default::default()
        };
        let (coordinator, mut rx) = coordinator(builder, FakePrompt::default());

        let outcome = coordinator.submit(&valid_form(false)).await.unwrap();
        match outcome {
            SubmitOutcome::Failed(message) => assert_eq!(message, "Balance is not sufficient"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(
            coordinator.state().await,
            SubmitState::Error("Balance is not sufficient".to_string())
        );
        let shown = coordinator.notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].1, Duration::from_secs(300));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resubmit_after_failure_clears_error() {
        let builder = FakeBuilder {
            fail_with: Some(BuildError::transport("node offline")),
            ..Default::default()
        };
        let (coordinator, _rx) = coordinator(builder, FakePrompt::default());
        let form = valid_form(false);

        coordinator.submit(&form).await.unwrap();
        assert!(matches!(coordinator.state().await, SubmitState::Error(_)));

        // Failed state does not block another attempt
        let outcome = coordinator.submit(&form).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(coordinator.notifier.dismissed.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.builder.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_submit_rejected() {
        let gate = Arc::new(Notify::new());
        let builder = FakeBuilder {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let (coordinator, _rx) = coordinator(builder, FakePrompt::default());
        let form = valid_form(false);

        let (first, second, _) = tokio::join!(
            coordinator.submit(&form),
            coordinator.submit(&form),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert!(matches!(first.unwrap(), SubmitOutcome::Submitted(_)));
        assert!(matches!(
            second.unwrap(),
            SubmitOutcome::Skipped(SkipReason::InFlight)
        ));
        assert_eq!(coordinator.builder.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_build_timeout() {
        let builder = FakeBuilder {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let settings = SubmitSettings {
            build_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let (coordinator, _rx) = SubmissionCoordinator::new(
            builder,
            FakePrompt::default(),
            FakeNotifier::default(),
            settings,
        );

        let outcome = coordinator.submit(&valid_form(false)).await.unwrap();
        match outcome {
            SubmitOutcome::Failed(message) => assert!(message.contains("timed out")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispose_stops_submissions() {
        let (coordinator, mut rx) = coordinator(FakeBuilder::default(), FakePrompt::default());

        coordinator.dispose().await;
        assert_eq!(coordinator.notifier.dismissed.load(Ordering::SeqCst), 1);
        assert!(rx.recv().await.is_none());

        let outcome = coordinator.submit(&valid_form(false)).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Skipped(SkipReason::Disposed)
        ));
    }
}
