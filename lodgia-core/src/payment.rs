use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider-reported payment state, reduced to the transitions the checkout
/// flow actually acts on. Only `Succeeded` permits booking persistence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotStarted,
    Processing,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    /// Map a provider status string onto the reduced set. Anything the
    /// provider reports that is neither terminal success nor still in
    /// flight counts as failed for gating purposes.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "succeeded" => PaymentStatus::Succeeded,
            "processing" | "requires_action" | "requires_confirmation" => {
                PaymentStatus::Processing
            }
            _ => PaymentStatus::Failed,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        *self == PaymentStatus::Succeeded
    }
}

/// Opaque payment session handle returned by the backend's checkout
/// endpoint. Immutable once created; one per checkout visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentSession {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

impl PaymentSession {
    pub fn new(client_secret: impl Into<String>) -> Self {
        Self {
            client_secret: client_secret.into(),
        }
    }
}

/// Whether the provider may bounce the user through a redirect flow
/// (3-D Secure and friends) during confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Redirect only when the provider's own protocol demands it.
    #[default]
    IfRequired,
    Never,
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmOptions {
    pub redirect: RedirectPolicy,
    pub return_url: Option<String>,
}

/// Port for the third-party payment provider. The provider is an opaque
/// capability: confirmation and status retrieval are forwarded, never
/// reimplemented. A confirm result alone is not trusted for gating:
/// redirect flows resolve asynchronously, so callers must re-fetch the
/// authoritative status afterwards.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Ask the provider to confirm payment against the session.
    async fn confirm_payment(
        &self,
        session: &PaymentSession,
        options: &ConfirmOptions,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Fetch the authoritative payment status for the session.
    async fn retrieve_status(
        &self,
        session: &PaymentSession,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>>;
}
