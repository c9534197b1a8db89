pub mod coordinator;
pub mod form;
pub mod mock;

pub use coordinator::{
    BookingPaymentCoordinator, CheckoutError, CheckoutOutcome, CheckoutPhase,
};
pub use form::BookingForm;
pub use mock::{MockBookingGateway, MockPaymentProvider};
