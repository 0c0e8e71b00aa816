pub mod checkout;
pub mod config;
pub mod payment;
pub mod ports;
