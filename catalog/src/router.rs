use std::future::ready;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::{routing::get, Router};
use health::{HealthFlags, HealthStatus, ProbeStatus};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::metrics_middleware::track_metrics;
use crate::prometheus::EXPOSITION_CONTENT_TYPE;
use crate::store::CatalogStore;

pub const SERVICE_NAME: &str = "product-service";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore + Send + Sync>,
    pub flags: HealthFlags,
}

async fn health(State(state): State<AppState>) -> HealthStatus {
    HealthStatus::of(&state.flags, SERVICE_NAME, SERVICE_VERSION)
}

async fn liveness() -> ProbeStatus {
    ProbeStatus::live()
}

async fn readiness(State(state): State<AppState>) -> ProbeStatus {
    ProbeStatus::ready(&state.flags)
}

pub fn router<S: CatalogStore + Send + Sync + 'static>(
    store: S,
    flags: HealthFlags,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let state = AppState {
        store: Arc::new(store),
        flags,
    };

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/api/deals", get(api::list_deals))
        .route("/api/products", get(api::list_products))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // The caller decides whether to expose the exporter. Installing a
    // global recorder when catalog is used as a library (during tests
    // etc) does not work well, so the handle is passed in rather than
    // created here.
    match metrics {
        Some(handle) => router.route(
            "/metrics",
            get(move || {
                ready((
                    [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
                    handle.render(),
                ))
            }),
        ),
        None => router,
    }
}
