//! The unit of work threaded through recording and notification.

use serde::Serialize;

use super::{Customer, Order, Product};

/// Assembled once per successful payment and never mutated afterward.
/// Serializes directly as the checkout success payload
/// `{customer, order, dinner}`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationContext {
    pub customer: Customer,
    pub order: Order,
    #[serde(rename = "dinner")]
    pub product: Product,
}
