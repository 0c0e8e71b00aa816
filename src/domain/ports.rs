use super::config::GatewayConfig;
use super::payment::{Payment, PaymentExecution, PaymentRequest};
use crate::error::VendorError;
use async_trait::async_trait;

/// The calls the adapter makes against a hosted-checkout vendor.
#[async_trait]
pub trait PaymentVendor: Send + Sync {
    /// Creates a pending payment; the response carries the approval link.
    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, VendorError>;
    /// Fetches a previously created payment.
    async fn get_payment(&self, payment_id: &str) -> Result<Payment, VendorError>;
    /// Executes an approved payment on behalf of the payer.
    async fn execute_payment(
        &self,
        payment_id: &str,
        execution: &PaymentExecution,
    ) -> Result<Payment, VendorError>;
}

pub type PaymentVendorBox = Box<dyn PaymentVendor>;

/// Builds an authenticated vendor client from a validated configuration.
pub type VendorConnector =
    Box<dyn Fn(&GatewayConfig) -> Result<PaymentVendorBox, VendorError> + Send + Sync>;
