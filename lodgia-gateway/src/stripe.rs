use std::time::Duration;

use async_trait::async_trait;
use lodgia_core::payment::{
    ConfirmOptions, PaymentProvider, PaymentSession, PaymentStatus, RedirectPolicy,
};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// Client secrets look like `pi_123_secret_456`; anything else cannot
    /// be resolved to a payment intent.
    #[error("client secret does not reference a payment intent")]
    MalformedClientSecret,
}

/// Thin adapter over the Stripe payment-intent API. Only the two
/// capabilities the checkout needs are forwarded: confirm, and retrieve
/// the authoritative status.
pub struct StripePaymentProvider {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripePaymentProvider {
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: secret_key.into(),
        })
    }

    /// Point the adapter at a different API host (stripe-mock, test doubles).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn intent_id<'a>(client_secret: &'a str) -> Result<&'a str, StripeError> {
        client_secret
            .split_once("_secret")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
            .ok_or(StripeError::MalformedClientSecret)
    }
}

#[derive(Debug, Deserialize)]
struct PaymentIntentDto {
    status: String,
}

#[async_trait]
impl PaymentProvider for StripePaymentProvider {
    async fn confirm_payment(
        &self,
        session: &PaymentSession,
        options: &ConfirmOptions,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let intent_id = Self::intent_id(&session.client_secret)?;
        let url = format!("{}/v1/payment_intents/{}/confirm", self.api_base, intent_id);
        debug!(%intent_id, "confirming payment intent");

        let mut params = vec![("client_secret", session.client_secret.as_str())];
        if let (RedirectPolicy::IfRequired, Some(return_url)) =
            (options.redirect, options.return_url.as_deref())
        {
            params.push(("return_url", return_url));
        }

        self.http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn retrieve_status(
        &self,
        session: &PaymentSession,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        let intent_id = Self::intent_id(&session.client_secret)?;
        let url = format!("{}/v1/payment_intents/{}", self.api_base, intent_id);

        let intent = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .query(&[("client_secret", session.client_secret.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<PaymentIntentDto>()
            .await?;

        debug!(%intent_id, status = %intent.status, "retrieved payment intent");
        Ok(PaymentStatus::from_provider(&intent.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_from_client_secret() {
        assert_eq!(
            StripePaymentProvider::intent_id("pi_3Abc_secret_Xyz").unwrap(),
            "pi_3Abc"
        );
        assert!(StripePaymentProvider::intent_id("garbage").is_err());
        assert!(StripePaymentProvider::intent_id("_secret_only").is_err());
    }
}
