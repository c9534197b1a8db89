use lodgia_core::booking::{BookingRequest, StayContext};
use lodgia_core::gateway::BookingGateway;
use lodgia_core::validation::{validate_booking, ValidationErrors};
use tracing::info;

/// The guest-details form. Owns the draft booking for one checkout visit;
/// the hotel and destination ids are bound from the stay context and stay
/// fixed while the guest edits the rest.
#[derive(Debug, Clone)]
pub struct BookingForm {
    booking: BookingRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum FormSubmitError {
    /// Field validation failed; errors map to wire field names for inline
    /// display. No network call was made.
    #[error(transparent)]
    Invalid(ValidationErrors),
    #[error("booking persistence failed: {0}")]
    Persist(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingForm {
    pub fn new(stay: &StayContext) -> Self {
        Self {
            booking: BookingRequest::for_stay(stay),
        }
    }

    pub fn set_guest_details(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_no: impl Into<String>,
        email: impl Into<String>,
    ) {
        self.booking.first_name = first_name.into();
        self.booking.last_name = last_name.into();
        self.booking.phone_no = phone_no.into();
        self.booking.email = email.into();
    }

    pub fn set_special_request(&mut self, special_req: impl Into<String>) {
        self.booking.special_req = special_req.into();
    }

    pub fn booking(&self) -> &BookingRequest {
        &self.booking
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_booking(&self.booking)
    }

    /// Submit the form: validate, then persist through the gateway.
    /// Invalid input short-circuits before any network call.
    pub async fn submit(&self, gateway: &dyn BookingGateway) -> Result<(), FormSubmitError> {
        self.validate().map_err(FormSubmitError::Invalid)?;
        gateway
            .persist_booking(&self.booking)
            .await
            .map_err(FormSubmitError::Persist)?;
        info!(hotel = %self.booking.hotel_id, "booking persisted");
        Ok(())
    }
}
