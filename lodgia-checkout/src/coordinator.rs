use std::sync::Arc;

use lodgia_core::gateway::BookingGateway;
use lodgia_core::payment::{ConfirmOptions, PaymentProvider, PaymentSession, PaymentStatus};
use lodgia_core::validation::ValidationErrors;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::form::{BookingForm, FormSubmitError};

/// Checkout lifecycle for one page visit.
///
/// ```text
/// Init --(session created)--> SessionReady
/// SessionReady --(pay)--> Confirming
/// Confirming --(status succeeded)--> Submitting
/// Confirming --(status not succeeded)--> SessionReady   (retry allowed)
/// Submitting --(persist ok)--> Done
/// Submitting --(persist failed)--> SessionReady         (payment kept, no compensation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Init,
    SessionReady,
    Confirming,
    Submitting,
    Done,
}

/// What a pay action resolved to. Everything here is a normal outcome the
/// caller routes on; failures that need surfacing are `CheckoutError`s.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// No payment session yet; the pay action is a no-op.
    SessionNotReady,
    /// A pay action is already in flight; this one was rejected.
    AlreadyProcessing,
    /// The booking was already persisted on an earlier pay action.
    AlreadyCompleted,
    /// The provider did not report success; the user may retry.
    PaymentNotCompleted(PaymentStatus),
    /// Payment succeeded and the booking was persisted; navigate to the
    /// confirmation view.
    Confirmed,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("payment session could not be created: {0}")]
    SessionInit(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("payment provider call failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    InvalidBooking(ValidationErrors),
    /// The provider captured the payment but the booking endpoint failed.
    /// No compensation (refund/void) is attempted; the succeeded status is
    /// kept so a retry goes straight to persistence.
    #[error("payment captured but booking was not saved: {source}")]
    BookingNotSaved {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

struct CheckoutState {
    phase: CheckoutPhase,
    session: Option<PaymentSession>,
    last_status: PaymentStatus,
}

/// Sequences payment confirmation before booking persistence: one payment
/// session per visit, confirm-then-retrieve on pay, persist only on a
/// retrieved `Succeeded`. Collaborators are injected ports, so the
/// sequencing is testable against stubs.
pub struct BookingPaymentCoordinator {
    provider: Arc<dyn PaymentProvider>,
    gateway: Arc<dyn BookingGateway>,
    confirm_options: ConfirmOptions,
    visit_id: Uuid,
    state: Mutex<CheckoutState>,
}

impl BookingPaymentCoordinator {
    pub fn new(provider: Arc<dyn PaymentProvider>, gateway: Arc<dyn BookingGateway>) -> Self {
        Self {
            provider,
            gateway,
            confirm_options: ConfirmOptions::default(),
            visit_id: Uuid::new_v4(),
            state: Mutex::new(CheckoutState {
                phase: CheckoutPhase::Init,
                session: None,
                last_status: PaymentStatus::NotStarted,
            }),
        }
    }

    pub fn with_confirm_options(mut self, options: ConfirmOptions) -> Self {
        self.confirm_options = options;
        self
    }

    pub fn visit_id(&self) -> Uuid {
        self.visit_id
    }

    pub async fn phase(&self) -> CheckoutPhase {
        self.state.lock().await.phase
    }

    /// True while a pay action is in flight; the pay control stays disabled.
    pub async fn is_processing_payment(&self) -> bool {
        matches!(
            self.state.lock().await.phase,
            CheckoutPhase::Confirming | CheckoutPhase::Submitting
        )
    }

    /// True while the booking is being persisted (the loading indicator).
    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.phase == CheckoutPhase::Submitting
    }

    pub async fn session(&self) -> Option<PaymentSession> {
        self.state.lock().await.session.clone()
    }

    pub async fn last_status(&self) -> PaymentStatus {
        self.state.lock().await.last_status
    }

    /// Create the payment session for this visit. Idempotent: once a
    /// session exists it is returned as-is with no further network call,
    /// however many times mounting logic invokes this. On failure the
    /// coordinator stays in `Init` and the call may be made again.
    pub async fn initialize_session(&self) -> Result<PaymentSession, CheckoutError> {
        {
            let state = self.state.lock().await;
            if let Some(session) = &state.session {
                return Ok(session.clone());
            }
        }

        match self.gateway.create_checkout_session().await {
            Ok(session) => {
                let mut state = self.state.lock().await;
                // keep the first session if a concurrent init won the race
                let session = state.session.get_or_insert(session).clone();
                if state.phase == CheckoutPhase::Init {
                    state.phase = CheckoutPhase::SessionReady;
                }
                info!(visit = %self.visit_id, "payment session ready");
                Ok(session)
            }
            Err(err) => {
                warn!(visit = %self.visit_id, error = %err, "payment session creation failed");
                Err(CheckoutError::SessionInit(err))
            }
        }
    }

    /// The pay action: confirm payment, re-fetch the authoritative status,
    /// and persist the booking only when that status is `Succeeded`.
    ///
    /// The guest form is validated before the provider is asked to confirm,
    /// so a payment is never captured for a booking that cannot persist.
    pub async fn submit_payment(
        &self,
        form: &BookingForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let (session, mut status) = {
            let mut state = self.state.lock().await;
            match state.phase {
                CheckoutPhase::Confirming | CheckoutPhase::Submitting => {
                    return Ok(CheckoutOutcome::AlreadyProcessing);
                }
                CheckoutPhase::Done => return Ok(CheckoutOutcome::AlreadyCompleted),
                CheckoutPhase::Init | CheckoutPhase::SessionReady => {}
            }
            let Some(session) = state.session.clone() else {
                return Ok(CheckoutOutcome::SessionNotReady);
            };
            form.validate().map_err(CheckoutError::InvalidBooking)?;
            state.phase = CheckoutPhase::Confirming;
            (session, state.last_status)
        };

        if !status.is_succeeded() {
            if let Err(err) = self
                .provider
                .confirm_payment(&session, &self.confirm_options)
                .await
            {
                warn!(visit = %self.visit_id, error = %err, "payment confirmation failed");
                self.reset_to_ready().await;
                return Err(CheckoutError::Provider(err));
            }

            // The confirm result is not trusted on its own: redirect flows
            // resolve asynchronously, so the status is re-fetched from the
            // provider before anything is gated on it.
            status = match self.provider.retrieve_status(&session).await {
                Ok(status) => status,
                Err(err) => {
                    warn!(visit = %self.visit_id, error = %err, "payment status retrieval failed");
                    self.reset_to_ready().await;
                    return Err(CheckoutError::Provider(err));
                }
            };
            self.state.lock().await.last_status = status;
        }

        if !status.is_succeeded() {
            info!(visit = %self.visit_id, ?status, "payment not completed, retry allowed");
            self.reset_to_ready().await;
            return Ok(CheckoutOutcome::PaymentNotCompleted(status));
        }

        self.state.lock().await.phase = CheckoutPhase::Submitting;
        match form.submit(self.gateway.as_ref()).await {
            Ok(()) => {
                self.state.lock().await.phase = CheckoutPhase::Done;
                info!(visit = %self.visit_id, "booking confirmed");
                Ok(CheckoutOutcome::Confirmed)
            }
            Err(FormSubmitError::Invalid(errors)) => {
                // form was validated before confirmation, so this only
                // triggers if the form changed mid-flight
                self.reset_to_ready().await;
                Err(CheckoutError::InvalidBooking(errors))
            }
            Err(FormSubmitError::Persist(source)) => {
                error!(
                    visit = %self.visit_id,
                    error = %source,
                    "payment captured but booking was not saved; no compensation attempted"
                );
                self.reset_to_ready().await;
                Err(CheckoutError::BookingNotSaved { source })
            }
        }
    }

    async fn reset_to_ready(&self) {
        self.state.lock().await.phase = CheckoutPhase::SessionReady;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBookingGateway, MockPaymentProvider};
    use chrono::NaiveDate;
    use lodgia_core::booking::{GuestCounts, StayContext};

    fn stay() -> StayContext {
        StayContext {
            hotel_id: "H1".to_string(),
            hotel_name: "Grand Plaza".to_string(),
            destination_id: "D1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            guests: GuestCounts {
                adults: 2,
                children: 0,
                rooms: 1,
            },
        }
    }

    fn filled_form() -> BookingForm {
        let mut form = BookingForm::new(&stay());
        form.set_guest_details("John", "Doe", "+65 85848392", "abc@mail.com");
        form
    }

    #[tokio::test]
    async fn test_session_created_once_across_reinvocations() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider, gateway.clone());

        let first = coordinator.initialize_session().await.unwrap();
        let second = coordinator.initialize_session().await.unwrap();
        let third = coordinator.initialize_session().await.unwrap();

        assert_eq!(gateway.sessions_created(), 1);
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);
    }

    #[tokio::test]
    async fn test_session_init_failure_is_retryable() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        gateway.fail_next_session();
        let coordinator = BookingPaymentCoordinator::new(provider, gateway.clone());

        let err = coordinator.initialize_session().await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionInit(_)));
        assert_eq!(coordinator.phase().await, CheckoutPhase::Init);

        coordinator.initialize_session().await.unwrap();
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);
        assert_eq!(gateway.sessions_created(), 1);
    }

    #[tokio::test]
    async fn test_pay_without_session_is_noop() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::SessionNotReady);
        assert_eq!(provider.confirm_calls(), 0);
        assert_eq!(gateway.bookings_persisted(), 0);
    }

    #[tokio::test]
    async fn test_succeeded_payment_persists_exactly_once() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();

        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(provider.confirm_calls(), 1);
        assert_eq!(provider.retrieve_calls(), 1);
        assert_eq!(gateway.bookings_persisted(), 1);
        assert_eq!(coordinator.phase().await, CheckoutPhase::Done);
    }

    #[tokio::test]
    async fn test_failed_payment_never_persists_and_allows_retry() {
        let provider = Arc::new(MockPaymentProvider::with_statuses(vec![
            PaymentStatus::Failed,
            PaymentStatus::Succeeded,
        ]));
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::PaymentNotCompleted(PaymentStatus::Failed)
        );
        assert_eq!(gateway.bookings_persisted(), 0);
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);

        // manual retry succeeds
        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(provider.confirm_calls(), 2);
        assert_eq!(gateway.bookings_persisted(), 1);
    }

    #[tokio::test]
    async fn test_processing_status_defers_persistence() {
        let provider = Arc::new(MockPaymentProvider::with_statuses(vec![
            PaymentStatus::Processing,
            PaymentStatus::Succeeded,
        ]));
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::PaymentNotCompleted(PaymentStatus::Processing)
        );
        assert_eq!(gateway.bookings_persisted(), 0);

        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(gateway.bookings_persisted(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_resets_processing_flag() {
        let provider = Arc::new(MockPaymentProvider::failing_confirm());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let err = coordinator.submit_payment(&filled_form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Provider(_)));
        assert!(!coordinator.is_processing_payment().await);
        assert!(!coordinator.is_submitting().await);
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);
        assert_eq!(gateway.bookings_persisted(), 0);
    }

    #[tokio::test]
    async fn test_pay_rejected_while_confirm_in_flight() {
        let provider = Arc::new(MockPaymentProvider::succeeding().with_blocking_confirm());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = Arc::new(BookingPaymentCoordinator::new(
            provider.clone(),
            gateway.clone(),
        ));

        coordinator.initialize_session().await.unwrap();

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.submit_payment(&filled_form()).await })
        };
        provider.wait_for_confirm_entry().await;
        assert!(coordinator.is_processing_payment().await);

        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::AlreadyProcessing);

        provider.release_confirm();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(provider.confirm_calls(), 1);
        assert_eq!(gateway.bookings_persisted(), 1);
    }

    #[tokio::test]
    async fn test_submitting_flag_visible_while_persist_in_flight() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new().with_blocking_persist());
        let coordinator = Arc::new(BookingPaymentCoordinator::new(provider, gateway.clone()));

        coordinator.initialize_session().await.unwrap();
        assert!(!coordinator.is_submitting().await);

        let pay = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.submit_payment(&filled_form()).await })
        };
        gateway.wait_for_persist_entry().await;
        assert!(coordinator.is_submitting().await);
        assert!(coordinator.is_processing_payment().await);

        gateway.release_persist();
        let outcome = pay.await.unwrap().unwrap();
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert!(!coordinator.is_submitting().await);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_captured_payment_and_skips_reconfirm() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        gateway.fail_next_persist();
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let err = coordinator.submit_payment(&filled_form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::BookingNotSaved { .. }));
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);
        assert_eq!(coordinator.last_status().await, PaymentStatus::Succeeded);

        // retry: payment already captured, so no second confirm
        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(provider.confirm_calls(), 1);
        assert_eq!(gateway.bookings_persisted(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_blocks_confirmation() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        let mut form = BookingForm::new(&stay());
        form.set_guest_details("John", "Doe", "abc", "abc@mail.com");

        let err = coordinator.submit_payment(&form).await.unwrap_err();
        match err {
            CheckoutError::InvalidBooking(errors) => {
                assert!(errors.field("phoneNo").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.confirm_calls(), 0);
        assert_eq!(gateway.bookings_persisted(), 0);
        assert_eq!(coordinator.phase().await, CheckoutPhase::SessionReady);
    }

    #[tokio::test]
    async fn test_done_is_terminal() {
        let provider = Arc::new(MockPaymentProvider::succeeding());
        let gateway = Arc::new(MockBookingGateway::new());
        let coordinator = BookingPaymentCoordinator::new(provider.clone(), gateway.clone());

        coordinator.initialize_session().await.unwrap();
        coordinator.submit_payment(&filled_form()).await.unwrap();

        let outcome = coordinator.submit_payment(&filled_form()).await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::AlreadyCompleted);
        assert_eq!(gateway.bookings_persisted(), 1);
    }
}
