use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use thiserror::Error;

use crate::router::AppState;
use crate::seed::{DEALS, PRODUCTS};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    /// Catch-all boundary for request handling: log the detail, answer
    /// with a generic 500. A failed request never changes process-wide
    /// health and never leaks internals to the client.
    fn into_response(self) -> Response {
        tracing::error!("request handling failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "internal server error"})),
        )
            .into_response()
    }
}

pub async fn list_deals(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.store.find_all(DEALS).await?))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.store.find_all(PRODUCTS).await?))
}
