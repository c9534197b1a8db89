mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use lodgia_checkout::{
    BookingForm, BookingPaymentCoordinator, CheckoutError, CheckoutOutcome, MockPaymentProvider,
};
use lodgia_core::payment::{ConfirmOptions, PaymentProvider, RedirectPolicy};
use lodgia_gateway::{HttpBookingGateway, StripePaymentProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Run one booking checkout: pay, then submit the guest details.
#[derive(Debug, Parser)]
#[command(name = "lodgia", version)]
struct Cli {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    special_request: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lodgia=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let stay = config.stay.to_context();
    let timeout = Duration::from_secs(config.backend.timeout_seconds);

    tracing::info!("Hotel Booking: {}", stay.summary());

    let provider: Arc<dyn PaymentProvider> = match &config.payment.stripe_secret_key {
        Some(key) => {
            let mut provider = StripePaymentProvider::new(key.clone(), timeout)?;
            if let Some(api_base) = &config.payment.stripe_api_base {
                provider = provider.with_api_base(api_base.clone());
            }
            Arc::new(provider)
        }
        None => {
            tracing::warn!("no Stripe key configured, using the mock provider");
            Arc::new(MockPaymentProvider::succeeding())
        }
    };
    let gateway = Arc::new(HttpBookingGateway::new(
        config.backend.base_url.as_str(),
        timeout,
    )?);

    let coordinator = Arc::new(
        BookingPaymentCoordinator::new(provider, gateway).with_confirm_options(ConfirmOptions {
            redirect: RedirectPolicy::IfRequired,
            return_url: config.payment.return_url.clone(),
        }),
    );

    coordinator.initialize_session().await?;
    tracing::info!("payment widget ready");

    let mut form = BookingForm::new(&stay);
    form.set_guest_details(cli.first_name, cli.last_name, cli.phone, cli.email);
    form.set_special_request(cli.special_request);

    let pay = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.submit_payment(&form).await })
    };

    // mirror the page's button/spinner text off the coordinator's phase
    let mut announced_processing = false;
    let mut announced_submitting = false;
    while !pay.is_finished() {
        if !announced_processing && coordinator.is_processing_payment().await {
            tracing::info!("Processing...");
            announced_processing = true;
        }
        if !announced_submitting && coordinator.is_submitting().await {
            tracing::info!("Confirming your reservation...");
            announced_submitting = true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    match pay.await? {
        Ok(CheckoutOutcome::Confirmed) => {
            tracing::info!("booking confirmed, navigating to confirmation");
            Ok(())
        }
        Ok(CheckoutOutcome::PaymentNotCompleted(status)) => {
            bail!("payment did not complete (status: {status:?}); run again to retry")
        }
        Ok(other) => bail!("checkout did not finish: {other:?}"),
        Err(CheckoutError::InvalidBooking(errors)) => {
            for error in &errors.errors {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("please correct the highlighted fields")
        }
        Err(err) => Err(err.into()),
    }
}
