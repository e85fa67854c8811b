//! # Application State
//!
//! Shared state for the HTTP handlers: the payment gateway (when its
//! configuration loaded), and the two fire-and-forget workflow
//! components holding their shared connection futures.

use std::sync::Arc;

use crate::clients::PaymentGateway;
use crate::notifier::ConfirmationNotifier;
use crate::recorder::RegistrationRecorder;
use crate::web::response_types::{ApiError, ApiResult};

/// Payment-processor wiring; absent when the payment configuration could
/// not be loaded at startup, in which case checkout and catalog requests
/// fail without taking the process down.
#[derive(Clone)]
pub struct PaymentState {
    pub gateway: Arc<dyn PaymentGateway>,
    /// Publishable key handed to the payment form.
    pub publishable_key: String,
    /// Catalog grouping for the single-active-listing lookup.
    pub default_product_id: String,
    /// Fixed currency code for every order.
    pub currency: String,
}

#[derive(Clone)]
pub struct AppState {
    pub payment: Option<PaymentState>,
    pub recorder: Arc<RegistrationRecorder>,
    pub notifier: Arc<ConfirmationNotifier>,
}

impl AppState {
    /// The payment wiring, or the error surfaced to callers while it is
    /// unconfigured.
    pub fn payment(&self) -> ApiResult<&PaymentState> {
        self.payment
            .as_ref()
            .ok_or_else(|| ApiError::checkout("payment processor is not configured"))
    }
}
