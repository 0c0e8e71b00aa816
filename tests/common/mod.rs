#![allow(dead_code)]

use async_trait::async_trait;
use checkout_adapter::application::adapter::PaymentGatewayAdapter;
use checkout_adapter::domain::checkout::CheckoutOptions;
use checkout_adapter::domain::payment::{Link, Payment, PaymentExecution, PaymentRequest};
use checkout_adapter::domain::ports::{PaymentVendor, PaymentVendorBox, VendorConnector};
use checkout_adapter::error::VendorError;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const APPROVE_HREF: &str = "https://pp.example/approve";
pub const RETURN_URL: &str = "https://shop.example/payment/return";
pub const CANCEL_URL: &str = "https://shop.example/payment/cancel";

/// A vendor double that counts every call and remembers what it was asked to create.
#[derive(Clone)]
pub struct StubVendor {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PaymentRequest>>>,
    executions: Arc<Mutex<Vec<PaymentExecution>>>,
    links: Vec<Link>,
    execute_state: Option<String>,
    fail_on: Option<&'static str>,
}

impl StubVendor {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            executions: Arc::new(Mutex::new(Vec::new())),
            links: vec![
                Link::new("self", "https://pp.example/v1/payments/payment/PAY-1"),
                Link::new("approval_url", APPROVE_HREF),
                Link::new("execute", "https://pp.example/v1/payments/payment/PAY-1/execute"),
            ],
            execute_state: Some("approved".to_string()),
            fail_on: None,
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    pub fn with_execute_state(mut self, state: Option<&str>) -> Self {
        self.execute_state = state.map(ToString::to_string);
        self
    }

    /// Makes `operation` ("create", "get" or "execute") fail as if the network dropped.
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_execution(&self) -> Option<PaymentExecution> {
        self.executions.lock().unwrap().last().cloned()
    }

    pub fn connector(&self) -> VendorConnector {
        let stub = self.clone();
        Box::new(move |_| Ok(Box::new(stub.clone()) as PaymentVendorBox))
    }

    fn enter(&self, operation: &'static str) -> Result<(), VendorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(operation) {
            return Err(VendorError::Unavailable("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentVendor for StubVendor {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, VendorError> {
        self.enter("create")?;
        self.requests.lock().unwrap().push(request.clone());
        Ok(Payment {
            id: "PAY-1".to_string(),
            state: Some("created".to_string()),
            links: self.links.clone(),
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, VendorError> {
        self.enter("get")?;
        Ok(Payment {
            id: payment_id.to_string(),
            state: Some("created".to_string()),
            links: vec![],
        })
    }

    async fn execute_payment(
        &self,
        payment_id: &str,
        execution: &PaymentExecution,
    ) -> Result<Payment, VendorError> {
        self.enter("execute")?;
        self.executions.lock().unwrap().push(execution.clone());
        Ok(Payment {
            id: payment_id.to_string(),
            state: self.execute_state.clone(),
            links: vec![],
        })
    }
}

pub fn valid_config() -> Value {
    json!({
        "client_id": "PAYPAL_CLIENT_ID",
        "secret": "PAYPAL_CLIENT_SECRET",
        "settings": {
            "mode": "sandbox",
            "http.ConnectionTimeOut": 1000,
            "log.LogEnabled": true,
            "log.FileName": "/logs/paypal.log",
            "log.LogLevel": "FINE"
        }
    })
}

pub fn options() -> CheckoutOptions {
    CheckoutOptions::new(RETURN_URL, CANCEL_URL)
}

pub fn adapter(stub: &StubVendor) -> PaymentGatewayAdapter {
    PaymentGatewayAdapter::new(stub.connector(), options())
}

pub fn configured_adapter(stub: &StubVendor) -> PaymentGatewayAdapter {
    let mut adapter = adapter(stub);
    adapter.configure(&valid_config()).unwrap();
    adapter
}
