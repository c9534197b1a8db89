use async_trait::async_trait;

use crate::booking::BookingRequest;
use crate::payment::PaymentSession;

/// Port for the booking backend. Two operations: open a payment session for
/// this checkout visit, and persist the finished booking. The backend's
/// internals (what it does with either call) are out of scope here.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// `POST /booking/checkout` with an empty JSON body; returns the
    /// session the payment widget renders against.
    async fn create_checkout_session(
        &self,
    ) -> Result<PaymentSession, Box<dyn std::error::Error + Send + Sync>>;

    /// `POST /booking` with the guest details payload.
    async fn persist_booking(
        &self,
        booking: &BookingRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
