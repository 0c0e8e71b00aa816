use crate::domain::config::GatewayConfig;
use crate::domain::payment::{Payment, PaymentExecution, PaymentRequest};
use crate::domain::ports::{PaymentVendor, PaymentVendorBox, VendorConnector};
use crate::error::VendorError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// A PayPal REST client for the v1 payments API.
///
/// Authenticates with the OAuth2 client-credentials grant. The access token is
/// requested on first use and reused until it is about to expire.
pub struct PaypalClient {
    base_url: Url,
    client_id: String,
    secret: String,
    http: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// PayPal answers errors in one of two shapes depending on the endpoint.
#[derive(Deserialize, Default)]
struct ErrorBody {
    name: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl PaypalClient {
    /// Creates a client for the environment selected by the configuration's `mode`.
    pub fn new(config: &GatewayConfig) -> Result<Self, VendorError> {
        let base_url = Url::parse(config.settings.mode.api_base())?;
        Self::with_base_url(config, base_url)
    }

    /// Creates a client against an explicit API host.
    pub fn with_base_url(config: &GatewayConfig, base_url: Url) -> Result<Self, VendorError> {
        let mut builder = reqwest::Client::builder();
        let timeout = config.settings.connection_timeout;
        if !timeout.is_zero() {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            base_url,
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
            http,
            token: Mutex::new(None),
        })
    }

    /// A connector handing out `PaypalClient`s, for `PaymentGatewayAdapter::new`.
    pub fn connector() -> VendorConnector {
        Box::new(|config| Ok(Box::new(PaypalClient::new(config)?) as PaymentVendorBox))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, VendorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VendorError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, VendorError> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref()
            && current.expires_at > Instant::now()
        {
            return Ok(current.value.clone());
        }

        let url = self.endpoint(&["v1", "oauth2", "token"])?;
        debug!(%url, "requesting access token");
        let request = self
            .http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")]);
        let response: TokenResponse = self.send("oauth2 token", request).await?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *token = Some(AccessToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(response.access_token)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, VendorError> {
        let token = self.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, VendorError> {
        let response = request.send().await.map_err(|e| {
            warn!(operation, error = %e, "vendor call failed");
            VendorError::from_transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(VendorError::from_transport)?;
        if !status.is_success() {
            let err = api_error(status, &body);
            warn!(operation, status = status.as_u16(), error = %err, "vendor rejected call");
            return Err(err);
        }

        debug!(operation, status = status.as_u16(), "vendor call succeeded");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PaymentVendor for PaypalClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, VendorError> {
        let url = self.endpoint(&["v1", "payments", "payment"])?;
        let builder = self.authorized(self.http.post(url).json(request)).await?;
        let payment: Payment = self.send("create payment", builder).await?;
        info!(payment_id = %payment.id, state = ?payment.state, "payment created");
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, VendorError> {
        let url = self.endpoint(&["v1", "payments", "payment", payment_id])?;
        let builder = self.authorized(self.http.get(url)).await?;
        self.send("fetch payment", builder).await
    }

    async fn execute_payment(
        &self,
        payment_id: &str,
        execution: &PaymentExecution,
    ) -> Result<Payment, VendorError> {
        let url = self.endpoint(&["v1", "payments", "payment", payment_id, "execute"])?;
        let builder = self.authorized(self.http.post(url).json(execution)).await?;
        let payment: Payment = self.send("execute payment", builder).await?;
        info!(payment_id = %payment.id, state = ?payment.state, "payment executed");
        Ok(payment)
    }
}

/// Turns a non-2xx answer into a `VendorError::Api`, keeping whatever PayPal explained.
fn api_error(status: StatusCode, body: &str) -> VendorError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let name = parsed
        .name
        .or(parsed.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("UNKNOWN").to_string());
    let message = parsed
        .message
        .or(parsed.error_description)
        .unwrap_or_else(|| body.chars().take(200).collect());

    VendorError::Api {
        status: status.as_u16(),
        name,
        message,
    }
}
