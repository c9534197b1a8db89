//! In-memory collaborators for exercising the coordinator without a
//! backend or a real payment provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use lodgia_core::booking::BookingRequest;
use lodgia_core::gateway::BookingGateway;
use lodgia_core::payment::{ConfirmOptions, PaymentProvider, PaymentSession, PaymentStatus};
use tokio::sync::Notify;

/// Scripted payment provider. Each `retrieve_status` call consumes the next
/// scripted status; the final one repeats.
pub struct MockPaymentProvider {
    statuses: Mutex<VecDeque<PaymentStatus>>,
    fail_confirm: bool,
    block_confirm: bool,
    confirm_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
    confirm_entered: Notify,
    confirm_release: Notify,
}

impl MockPaymentProvider {
    pub fn with_statuses(statuses: Vec<PaymentStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            fail_confirm: false,
            block_confirm: false,
            confirm_calls: AtomicUsize::new(0),
            retrieve_calls: AtomicUsize::new(0),
            confirm_entered: Notify::new(),
            confirm_release: Notify::new(),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_statuses(vec![PaymentStatus::Succeeded])
    }

    pub fn failing_confirm() -> Self {
        let mut provider = Self::succeeding();
        provider.fail_confirm = true;
        provider
    }

    /// Make `confirm_payment` park until `release_confirm` is called, so a
    /// test can observe the in-flight state.
    pub fn with_blocking_confirm(mut self) -> Self {
        self.block_confirm = true;
        self
    }

    pub async fn wait_for_confirm_entry(&self) {
        self.confirm_entered.notified().await;
    }

    pub fn release_confirm(&self) {
        self.confirm_release.notify_one();
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn confirm_payment(
        &self,
        _session: &PaymentSession,
        _options: &ConfirmOptions,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if self.block_confirm {
            self.confirm_entered.notify_one();
            self.confirm_release.notified().await;
        }
        if self.fail_confirm {
            return Err("simulated provider failure".into());
        }
        Ok(())
    }

    async fn retrieve_status(
        &self,
        _session: &PaymentSession,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().copied().unwrap_or(PaymentStatus::Failed)
        };
        Ok(status)
    }
}

/// Booking backend that records every call. Sessions get distinct client
/// secrets so tests can tell whether one was created twice.
pub struct MockBookingGateway {
    sessions_created: AtomicUsize,
    fail_next_session: AtomicBool,
    fail_next_persist: AtomicBool,
    block_persist: bool,
    persist_entered: Notify,
    persist_release: Notify,
    persisted: Mutex<Vec<BookingRequest>>,
}

impl MockBookingGateway {
    pub fn new() -> Self {
        Self {
            sessions_created: AtomicUsize::new(0),
            fail_next_session: AtomicBool::new(false),
            fail_next_persist: AtomicBool::new(false),
            block_persist: false,
            persist_entered: Notify::new(),
            persist_release: Notify::new(),
            persisted: Mutex::new(Vec::new()),
        }
    }

    /// Make `persist_booking` park until `release_persist` is called, so a
    /// test can observe the submitting state.
    pub fn with_blocking_persist(mut self) -> Self {
        self.block_persist = true;
        self
    }

    pub async fn wait_for_persist_entry(&self) {
        self.persist_entered.notified().await;
    }

    pub fn release_persist(&self) {
        self.persist_release.notify_one();
    }

    pub fn fail_next_session(&self) {
        self.fail_next_session.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_persist(&self) {
        self.fail_next_persist.store(true, Ordering::SeqCst);
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    pub fn bookings_persisted(&self) -> usize {
        self.persisted.lock().unwrap().len()
    }

    pub fn persisted(&self) -> Vec<BookingRequest> {
        self.persisted.lock().unwrap().clone()
    }
}

impl Default for MockBookingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingGateway for MockBookingGateway {
    async fn create_checkout_session(
        &self,
    ) -> Result<PaymentSession, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_next_session.swap(false, Ordering::SeqCst) {
            return Err("simulated session endpoint failure".into());
        }
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentSession::new(format!("cs_test_{n}")))
    }

    async fn persist_booking(
        &self,
        booking: &BookingRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.block_persist {
            self.persist_entered.notify_one();
            self.persist_release.notified().await;
        }
        if self.fail_next_persist.swap(false, Ordering::SeqCst) {
            return Err("simulated booking endpoint failure".into());
        }
        self.persisted.lock().unwrap().push(booking.clone());
        Ok(())
    }
}
