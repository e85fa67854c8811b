//! # HTTP Surface
//!
//! One route, two verbs: `GET /api` serves the catalog lookup and
//! `POST /api` runs the checkout orchestration. Anything else on the
//! route is answered 405 by the method router.

pub mod handlers;
pub mod response_types;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use response_types::{ApiError, ApiResult};
pub use state::{AppState, PaymentState};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api",
            get(handlers::catalog::catalog).post(handlers::checkout::checkout),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
