use crate::domain::payment::{
    Intent, Item, ItemList, Payer, PaymentRequest, RedirectUrls, Transaction, TransactionAmount,
};
use crate::error::{GatewayError, InvalidAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter carrying the correlation value on return and cancel URLs.
pub const CORRELATION_QUERY_PARAM: &str = "param";

/// Decimal places the vendor accepts on a money value.
const MONEY_SCALE: u32 = 2;

/// A positive amount to charge, in whole cents.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Rejects zero, negative and sub-cent values. Trailing zeros are fine: `10.000` is `10.00`.
    pub fn new(value: Decimal) -> Result<Self, InvalidAmount> {
        if value <= Decimal::ZERO {
            return Err(InvalidAmount::NotPositive(value));
        }
        if value.normalize().scale() > MONEY_SCALE {
            return Err(InvalidAmount::SubCent(value));
        }
        Ok(Self(value.round_dp(MONEY_SCALE)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = InvalidAmount;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Fixed parts of every checkout: where the payer comes back to, and how the cart line reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub return_url: String,
    pub cancel_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_label")]
    pub item_name: String,
    #[serde(default = "default_label")]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_label() -> String {
    "Deposit".to_string()
}

fn default_quantity() -> u32 {
    1
}

impl CheckoutOptions {
    /// Options with a one-item USD "Deposit" cart.
    pub fn new(return_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            return_url: return_url.into(),
            cancel_url: cancel_url.into(),
            currency: default_currency(),
            item_name: default_label(),
            description: default_label(),
            quantity: default_quantity(),
        }
    }

    /// Options without redirect URLs, for hosts that only validate or confirm.
    pub fn without_redirects() -> Self {
        Self::new(String::new(), String::new())
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Everything needed to open one checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub amount: Amount,
    pub currency: String,
    pub item_name: String,
    pub description: String,
    pub quantity: u32,
    pub return_url: String,
    pub cancel_url: String,
    pub correlation_param: Option<String>,
}

impl CheckoutRequest {
    /// Fails with [`GatewayError::ZeroQuantity`] when the options ask for an empty cart line.
    pub fn new(
        options: &CheckoutOptions,
        amount: Amount,
        correlation_param: Option<&str>,
    ) -> Result<Self, GatewayError> {
        if options.quantity == 0 {
            return Err(GatewayError::ZeroQuantity);
        }
        Ok(Self {
            amount,
            currency: options.currency.clone(),
            item_name: options.item_name.clone(),
            description: options.description.clone(),
            quantity: options.quantity,
            return_url: options.return_url.clone(),
            cancel_url: options.cancel_url.clone(),
            correlation_param: correlation_param.map(ToString::to_string),
        })
    }

    /// Builds the vendor request: a single cart line priced at the amount, a matching
    /// total, a `sale` intent, and both redirect URLs tagged with the correlation value.
    pub fn to_payment_request(&self) -> PaymentRequest {
        let price = self.amount.value();
        let item = Item {
            name: self.item_name.clone(),
            currency: self.currency.clone(),
            price,
            quantity: self.quantity,
        };

        PaymentRequest {
            intent: Intent::Sale,
            payer: Payer {
                payment_method: "paypal".to_string(),
            },
            redirect_urls: RedirectUrls {
                return_url: redirect_url(&self.return_url, self.correlation_param.as_deref()),
                cancel_url: redirect_url(&self.cancel_url, self.correlation_param.as_deref()),
            },
            transactions: vec![Transaction {
                amount: TransactionAmount {
                    currency: self.currency.clone(),
                    total: price * Decimal::from(self.quantity),
                },
                item_list: ItemList { items: vec![item] },
                description: self.description.clone(),
            }],
        }
    }
}

/// `base?param=value`, or `base` untouched when there is nothing to correlate.
///
/// The value is appended verbatim.
pub fn redirect_url(base: &str, correlation_param: Option<&str>) -> String {
    match correlation_param {
        Some(value) => format!("{base}?{CORRELATION_QUERY_PARAM}={value}"),
        None => base.to_string(),
    }
}

/// A pending payment on the vendor side plus the page the payer must visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    pub payment_id: String,
    pub approval_url: String,
}

/// What the vendor hands back when it redirects the payer to us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub payer_id: String,
    pub payment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_param: Option<String>,
}

impl PaymentConfirmation {
    /// Reads the ids from a redirect-back URL.
    ///
    /// Accepts the vendor's `paymentId`/`PayerID` as well as `payment_id`/`payer_id`.
    /// Returns `None` when either id is missing or empty.
    pub fn from_callback_url(url: &Url) -> Option<Self> {
        let mut payer_id = None;
        let mut payment_id = None;
        let mut correlation_param = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "PayerID" | "payer_id" => payer_id = Some(value.into_owned()),
                "paymentId" | "payment_id" => payment_id = Some(value.into_owned()),
                CORRELATION_QUERY_PARAM => correlation_param = Some(value.into_owned()),
                _ => {}
            }
        }

        Some(Self {
            payer_id: payer_id.filter(|v| !v.is_empty())?,
            payment_id: payment_id.filter(|v| !v.is_empty())?,
            correlation_param,
        })
    }
}
