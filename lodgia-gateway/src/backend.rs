use std::time::Duration;

use async_trait::async_trait;
use lodgia_core::booking::BookingRequest;
use lodgia_core::gateway::BookingGateway;
use lodgia_core::payment::PaymentSession;
use tracing::debug;

/// Booking backend reached over HTTP. Timeout semantics live entirely in
/// the client; the coordinator never retries on its own.
pub struct HttpBookingGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBookingGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BookingGateway for HttpBookingGateway {
    async fn create_checkout_session(
        &self,
    ) -> Result<PaymentSession, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/booking/checkout", self.base_url);
        debug!(%url, "creating checkout session");
        let session = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?
            .json::<PaymentSession>()
            .await?;
        Ok(session)
    }

    async fn persist_booking(
        &self,
        booking: &BookingRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/booking", self.base_url);
        debug!(%url, hotel = %booking.hotel_id, "persisting booking");
        self.http
            .post(&url)
            .json(booking)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
