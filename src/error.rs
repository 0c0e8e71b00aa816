use std::sync::Arc;
use thiserror::Error;

/// Failures raised by a vendor client (the real HTTP client or a stub).
#[derive(Error, Debug)]
pub enum VendorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vendor call timed out")]
    Timeout,
    #[error("vendor API error ({status}) {name}: {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },
    #[error("could not decode vendor response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("vendor unavailable: {0}")]
    Unavailable(String),
    #[error("invalid vendor URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl VendorError {
    /// Builds the error for a failed HTTP call, keeping timeouts apart.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// A checkout amount the vendor could not be charged exactly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAmount {
    #[error("amount must be positive, got {0}")]
    NotPositive(rust_decimal::Decimal),
    #[error("amount {0} has more than two decimal places")]
    SubCent(rust_decimal::Decimal),
}

/// Problems with the gateway configuration or with building the client context from it.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("configuration does not exist")]
    Missing,
    #[error("configuration is not a mapping")]
    NotAMapping,
    #[error("{0} is not set in the configuration")]
    MissingField(&'static str),
    #[error("setting `{0}` is not set in the configuration")]
    MissingSetting(&'static str),
    #[error("`{key}` has an invalid value: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("could not create client context: {0}")]
    Context(#[source] Arc<VendorError>),
    #[error("could not read configuration file: {0}")]
    Io(#[source] Arc<std::io::Error>),
    #[error("configuration file is not valid JSON: {0}")]
    Parse(#[source] Arc<serde_json::Error>),
}

/// Failures of checkout and confirmation operations.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("{operation} failed: {cause}")]
    Vendor {
        operation: &'static str,
        #[source]
        cause: Arc<VendorError>,
    },
    #[error("payment {payment_id} has no approval_url link")]
    MissingApprovalUrl { payment_id: String },
    #[error("adapter is not configured")]
    NotConfigured,
    #[error("adapter is already configured")]
    AlreadyConfigured,
    #[error("no payment is awaiting confirmation")]
    NothingToConfirm,
    #[error("cart quantity must be at least 1")]
    ZeroQuantity,
}

impl GatewayError {
    pub fn vendor(operation: &'static str, cause: VendorError) -> Self {
        Self::Vendor {
            operation,
            cause: Arc::new(cause),
        }
    }
}

/// The error every public adapter operation returns.
///
/// Cloning is cheap: causes live behind `Arc`, so the first failure can be handed
/// back on every later call while staying reachable through `source()`.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
