pub mod backend;
pub mod stripe;

pub use backend::HttpBookingGateway;
pub use stripe::StripePaymentProvider;
