use crate::domain::checkout::{Amount, CheckoutOptions, CheckoutRequest, CheckoutSession};
use crate::domain::config::{GatewayConfig, validate_config};
use crate::domain::payment::{Payment, PaymentExecution};
use crate::domain::ports::{PaymentVendorBox, VendorConnector};
use crate::error::{AdapterError, ConfigError, GatewayError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Where an adapter stands in the checkout flow.
#[derive(Debug, Clone)]
pub enum AdapterState {
    Unconfigured,
    Configured,
    SessionCreated(CheckoutSession),
    ConfirmationPending {
        payment: Payment,
        execution: PaymentExecution,
    },
    Confirmed {
        payment_id: String,
    },
    Declined {
        payment_id: String,
        state: Option<String>,
    },
    /// Terminal. Every operation returns this error until the adapter is dropped.
    Errored(AdapterError),
}

/// Drives one hosted checkout: configure, open a session, then confirm it.
///
/// The first failure poisons the instance. From then on every operation hands back
/// that same error without touching the vendor; build a new adapter to start over.
/// The adapter never logs or renders errors, [`last_error`](Self::last_error) is
/// there for the host to do it.
pub struct PaymentGatewayAdapter {
    connector: VendorConnector,
    options: CheckoutOptions,
    vendor: Option<PaymentVendorBox>,
    correlation_param: Option<String>,
    state: AdapterState,
}

impl PaymentGatewayAdapter {
    /// Creates an unconfigured adapter.
    ///
    /// # Arguments
    ///
    /// * `connector` - Builds the vendor client once the configuration is known.
    /// * `options` - Redirect URLs and cart defaults used for every session.
    pub fn new(connector: VendorConnector, options: CheckoutOptions) -> Self {
        Self {
            connector,
            options,
            vendor: None,
            correlation_param: None,
            state: AdapterState::Unconfigured,
        }
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }

    /// The sticky error, once something failed.
    pub fn last_error(&self) -> Option<&AdapterError> {
        match &self.state {
            AdapterState::Errored(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        matches!(self.state, AdapterState::Errored(_))
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }

    pub fn correlation_param(&self) -> Option<&str> {
        self.correlation_param.as_deref()
    }

    /// Checks a raw configuration mapping.
    ///
    /// See [`validate_config`] for the order of checks. A failure poisons the adapter.
    pub fn validate_config(&mut self, raw: &Value) -> Result<GatewayConfig> {
        self.ensure_healthy()?;
        validate_config(raw).or_else(|err| self.poison(err))
    }

    /// Validates the configuration and builds the authenticated vendor client from it.
    pub fn configure(&mut self, raw: &Value) -> Result<()> {
        self.ensure_healthy()?;
        if self.vendor.is_some() {
            return self.poison(GatewayError::AlreadyConfigured);
        }

        let config = self.validate_config(raw)?;
        match (self.connector)(&config) {
            Ok(vendor) => {
                self.vendor = Some(vendor);
                self.state = AdapterState::Configured;
                Ok(())
            }
            Err(err) => self.poison(ConfigError::Context(Arc::new(err))),
        }
    }

    /// Sets the value appended as `?param=` to the return and cancel URLs.
    pub fn set_correlation_param(&mut self, value: impl Into<String>) {
        self.correlation_param = Some(value.into());
    }

    /// The request a session for `amount` would submit.
    pub fn checkout_request(&self, amount: Amount) -> Result<CheckoutRequest, GatewayError> {
        CheckoutRequest::new(&self.options, amount, self.correlation_param.as_deref())
    }

    /// Opens a checkout session for `amount` and returns the page the payer must visit.
    ///
    /// Redirecting the payer is up to the caller. A response without an
    /// `approval_url` link is an error.
    pub async fn create_checkout_session(&mut self, amount: Amount) -> Result<CheckoutSession> {
        self.ensure_healthy()?;
        if self.vendor.is_none() {
            return self.poison(GatewayError::NotConfigured);
        }
        let request = match self.checkout_request(amount) {
            Ok(request) => request.to_payment_request(),
            Err(err) => return self.poison(err),
        };
        let Some(vendor) = self.vendor.as_ref() else {
            return self.poison(GatewayError::NotConfigured);
        };

        let created = vendor.create_payment(&request).await;
        let payment = match created {
            Ok(payment) => payment,
            Err(err) => return self.poison(GatewayError::vendor("create payment", err)),
        };

        let Some(approval_url) = payment.approval_url() else {
            return self.poison(GatewayError::MissingApprovalUrl {
                payment_id: payment.id,
            });
        };

        let session = CheckoutSession {
            payment_id: payment.id.clone(),
            approval_url: approval_url.to_string(),
        };
        self.state = AdapterState::SessionCreated(session.clone());
        Ok(session)
    }

    /// Loads the payment the payer just approved and readies its execution.
    ///
    /// Works on any configured adapter: the redirect-back usually lands on a fresh
    /// instance that never saw the session being created.
    pub async fn begin_confirmation(&mut self, payment_id: &str, payer_id: &str) -> Result<()> {
        self.ensure_healthy()?;
        let Some(vendor) = self.vendor.as_ref() else {
            return self.poison(GatewayError::NotConfigured);
        };

        let fetched = vendor.get_payment(payment_id).await;
        match fetched {
            Ok(payment) => {
                self.state = AdapterState::ConfirmationPending {
                    payment,
                    execution: PaymentExecution {
                        payer_id: payer_id.to_string(),
                    },
                };
                Ok(())
            }
            Err(err) => self.poison(GatewayError::vendor("fetch payment", err)),
        }
    }

    /// Executes the pending payment.
    ///
    /// `Ok(true)` only when the vendor reports the payment `approved`; any other
    /// state, or none, is a decline and yields `Ok(false)`. Only a failed vendor call
    /// is an error.
    pub async fn confirm(&mut self) -> Result<bool> {
        self.ensure_healthy()?;
        let pending = match &self.state {
            AdapterState::ConfirmationPending { payment, execution } => {
                Some((payment.id.clone(), execution.clone()))
            }
            _ => None,
        };
        let Some((payment_id, execution)) = pending else {
            return self.poison(GatewayError::NothingToConfirm);
        };
        let Some(vendor) = self.vendor.as_ref() else {
            return self.poison(GatewayError::NotConfigured);
        };

        let outcome = vendor.execute_payment(&payment_id, &execution).await;
        let executed = match outcome {
            Ok(executed) => executed,
            Err(err) => return self.poison(GatewayError::vendor("execute payment", err)),
        };

        let approved = executed.is_approved();
        self.state = if approved {
            AdapterState::Confirmed { payment_id }
        } else {
            AdapterState::Declined {
                payment_id,
                state: executed.state,
            }
        };
        Ok(approved)
    }

    fn ensure_healthy(&self) -> Result<()> {
        match &self.state {
            AdapterState::Errored(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn poison<T>(&mut self, err: impl Into<AdapterError>) -> Result<T> {
        let err = err.into();
        self.state = AdapterState::Errored(err.clone());
        Err(err)
    }
}
