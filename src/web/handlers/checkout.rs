//! # Checkout Orchestrator
//!
//! `POST /api` — the one workflow this service exists for. Validates the
//! submission, drives the payment processor serially (each step's output
//! feeds the next), then records and notifies concurrently. Recording
//! and notification are side effects: their failures never affect the
//! response, and there is no compensating transaction — once the order
//! is paid, the caller gets a success even if both side effects fail.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::models::{CheckoutRequest, RegistrationContext, Submission};
use crate::web::response_types::{ApiError, ApiResult};
use crate::web::state::AppState;

pub async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrationContext>> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let submission = Submission::try_from(request)?;
    let payment = state.payment()?;
    let gateway = &payment.gateway;

    info!(email = %submission.email, "looking up customer");
    let customer = match gateway.find_customer_by_email(&submission.email).await? {
        Some(existing) => {
            // Known asymmetry: the freshly submitted token is not
            // attached to an existing customer; whatever source is on
            // file gets charged.
            info!(customer = %existing.id, "reusing existing customer, submitted token left unattached");
            existing
        }
        None => {
            info!(email = %submission.email, "no existing customer, creating one");
            gateway
                .create_customer(
                    &submission.email,
                    &submission.name,
                    &submission.payment_token,
                )
                .await?
        }
    };

    info!(customer = %customer.id, "creating order");
    let cart = gateway
        .create_order(&customer.id, &submission.product_id, &payment.currency)
        .await?;

    info!(order = %cart.id, "paying order");
    let order = gateway.pay_order(&cart.id, &customer.id).await?;
    info!(order = %order.id, "order complete");

    let product = gateway.retrieve_product(&submission.product_id).await?;

    let context = RegistrationContext {
        customer,
        order,
        product,
    };

    // Independent side effects, jointly awaited; both absorb their own
    // failures, so the results are discarded here.
    let (_row, _receipt) = tokio::join!(
        state.recorder.track(&context),
        state.notifier.confirm(&context)
    );

    Ok(Json(context))
}
