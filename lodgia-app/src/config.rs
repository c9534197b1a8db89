use chrono::NaiveDate;
use lodgia_core::booking::{GuestCounts, StayContext};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub payment: PaymentConfig,
    pub stay: StayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// When absent, the mock provider is wired in instead of Stripe.
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: Option<String>,
    pub return_url: Option<String>,
}

/// The stay the visitor navigated from: which hotel, which dates, how many
/// guests. This is the navigation context of the checkout screen.
#[derive(Debug, Deserialize, Clone)]
pub struct StayConfig {
    pub hotel_id: String,
    pub hotel_name: String,
    pub destination_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
}

impl StayConfig {
    pub fn to_context(&self) -> StayContext {
        StayContext {
            hotel_id: self.hotel_id.clone(),
            hotel_name: self.hotel_name.clone(),
            destination_id: self.destination_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            guests: GuestCounts {
                adults: self.adults,
                children: self.children,
                rooms: self.rooms,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("LODGIA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
