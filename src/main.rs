use checkout_adapter::application::adapter::PaymentGatewayAdapter;
use checkout_adapter::domain::checkout::{Amount, CheckoutOptions, PaymentConfirmation};
use checkout_adapter::domain::config::load_config_file;
use checkout_adapter::infrastructure::paypal::PaypalClient;
use checkout_adapter::observability::init_logging;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway configuration file (JSON)
    #[arg(long, short)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the configuration file and exit
    Validate,

    /// Open a checkout session and print the approval URL
    Checkout {
        /// Amount to deposit, e.g. 10.00
        amount: Decimal,

        /// Where the payer lands after approving
        #[arg(long)]
        return_url: String,

        /// Where the payer lands after cancelling
        #[arg(long)]
        cancel_url: String,

        /// Value appended as `?param=` to both redirect URLs
        #[arg(long)]
        param: Option<String>,

        #[arg(long, default_value = "USD")]
        currency: String,

        #[arg(long, default_value = "Deposit")]
        description: String,
    },

    /// Execute a payment the payer has approved
    Confirm {
        #[arg(long, required_unless_present = "callback_url")]
        payment_id: Option<String>,

        #[arg(long, required_unless_present = "callback_url")]
        payer_id: Option<String>,

        /// Redirect-back URL; the ids are read from its query string
        #[arg(long, conflicts_with_all = ["payment_id", "payer_id"])]
        callback_url: Option<Url>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let raw = load_config_file(&cli.config).into_diagnostic()?;

    match cli.command {
        Command::Validate => {
            let mut adapter = PaymentGatewayAdapter::new(
                PaypalClient::connector(),
                CheckoutOptions::without_redirects(),
            );
            let config = adapter.validate_config(&raw).into_diagnostic()?;
            println!(
                "configuration is valid (mode: {:?}, timeout: {} ms)",
                config.settings.mode,
                config.settings.connection_timeout.as_millis()
            );
        }
        Command::Checkout {
            amount,
            return_url,
            cancel_url,
            param,
            currency,
            description,
        } => {
            let amount = Amount::new(amount).into_diagnostic()?;
            let options = CheckoutOptions::new(return_url, cancel_url)
                .with_currency(currency)
                .with_description(description);
            let mut adapter = PaymentGatewayAdapter::new(PaypalClient::connector(), options);

            let config = adapter.validate_config(&raw).into_diagnostic()?;
            let _guard = init_logging(&config.settings).into_diagnostic()?;

            adapter.configure(&raw).into_diagnostic()?;
            if let Some(param) = param {
                adapter.set_correlation_param(param);
            }
            let session = adapter
                .create_checkout_session(amount)
                .await
                .into_diagnostic()?;

            println!("payment_id: {}", session.payment_id);
            println!("approval_url: {}", session.approval_url);
        }
        Command::Confirm {
            payment_id,
            payer_id,
            callback_url,
        } => {
            let confirmation = match callback_url {
                Some(url) => PaymentConfirmation::from_callback_url(&url)
                    .ok_or_else(|| miette!("callback URL has no payment id or payer id"))?,
                None => PaymentConfirmation {
                    payment_id: payment_id.ok_or_else(|| miette!("--payment-id is required"))?,
                    payer_id: payer_id.ok_or_else(|| miette!("--payer-id is required"))?,
                    correlation_param: None,
                },
            };

            let mut adapter = PaymentGatewayAdapter::new(
                PaypalClient::connector(),
                CheckoutOptions::without_redirects(),
            );
            let config = adapter.validate_config(&raw).into_diagnostic()?;
            let _guard = init_logging(&config.settings).into_diagnostic()?;

            adapter.configure(&raw).into_diagnostic()?;
            adapter
                .begin_confirmation(&confirmation.payment_id, &confirmation.payer_id)
                .await
                .into_diagnostic()?;

            if adapter.confirm().await.into_diagnostic()? {
                println!("approved: {}", confirmation.payment_id);
            } else {
                println!("declined: {}", confirmation.payment_id);
            }
        }
    }

    Ok(())
}
