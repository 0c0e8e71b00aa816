//! Application layer: the checkout flow orchestration.
//!
//! `PaymentGatewayAdapter` owns the vendor client built at configuration time and
//! tracks one checkout through an explicit lifecycle, refusing all work once any
//! step has failed.

pub mod adapter;
