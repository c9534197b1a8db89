pub mod booking;
pub mod gateway;
pub mod payment;
pub mod validation;

pub use booking::{BookingRequest, GuestCounts, StayContext};
pub use gateway::BookingGateway;
pub use payment::{ConfirmOptions, PaymentProvider, PaymentSession, PaymentStatus, RedirectPolicy};
pub use validation::{validate_booking, FieldError, ValidationErrors};
