//! # Catalog Lookup
//!
//! `GET /api` — hands the payment form its publishable key plus the
//! event to sell: an explicit `?sku=` when given, otherwise the single
//! active listing for the configured catalog grouping.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Product;
use crate::web::response_types::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub sku: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub stripe_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinner: Option<Product>,
}

pub async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<CatalogResponse>> {
    let payment = state.payment()?;

    let dinner = match query.sku {
        Some(sku) => {
            debug!(sku = %sku, "catalog lookup by sku");
            Some(payment.gateway.retrieve_product(&sku).await?)
        }
        None => {
            debug!(product = %payment.default_product_id, "catalog lookup of active listing");
            payment
                .gateway
                .first_active_product(&payment.default_product_id)
                .await?
        }
    };

    Ok(Json(CatalogResponse {
        stripe_key: payment.publishable_key.clone(),
        dinner,
    }))
}
