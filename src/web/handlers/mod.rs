//! HTTP handlers for the registration API.

pub mod catalog;
pub mod checkout;
