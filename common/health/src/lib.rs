use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Health reporting for the service process.
///
/// Orchestrators need to tell three things apart: is the process
/// scheduling work at all (liveness), is it in a state where it can
/// keep running (health), and has it finished initializing so real
/// traffic can be routed to it (readiness).
///
/// Merging these into a single state is full of foot-guns, so
/// HealthFlags keeps `healthy` and `ready` as two independent flags
/// and leaves liveness to the transport: if the probe endpoint
/// answers at all, the process is live.
///
/// Flag policy (enforced by callers, not by this type):
///   - `healthy` starts true, goes false on fatal startup failure or
///     on a shutdown signal, and never returns to true within a
///     process lifetime.
///   - `ready` starts false, goes true when data initialization
///     completes, and goes (or stays) false when it fails. There is
///     no retry; a restart is the recovery path.
#[derive(Clone)]
pub struct HealthFlags {
    healthy: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
}

impl Default for HealthFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthFlags {
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(true)),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn report_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn report_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Last-write-wins, callable from any task.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Last-write-wins, callable from any task.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

/// Body of `GET /health`: overall process health plus service identity.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

impl HealthStatus {
    pub fn of(flags: &HealthFlags, service: &'static str, version: &'static str) -> Self {
        match flags.report_healthy() {
            true => Self {
                status: "UP",
                service,
                version: Some(version),
            },
            false => Self {
                status: "DOWN",
                service,
                version: None,
            },
        }
    }
}

impl IntoResponse for HealthStatus {
    fn into_response(self) -> Response {
        let code = match self.status {
            "UP" => StatusCode::OK,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        (code, Json(self)).into_response()
    }
}

/// Body of the liveness and readiness probes.
#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    pub status: &'static str,
    pub timestamp: String,
}

impl ProbeStatus {
    /// Liveness: answering at all is the signal, so this is always "UP".
    pub fn live() -> Self {
        Self {
            status: "UP",
            timestamp: now_rfc3339(),
        }
    }

    /// Readiness: the signal load balancers must consult before
    /// routing real traffic.
    pub fn ready(flags: &HealthFlags) -> Self {
        Self {
            status: if flags.report_ready() { "UP" } else { "DOWN" },
            timestamp: now_rfc3339(),
        }
    }
}

impl IntoResponse for ProbeStatus {
    fn into_response(self) -> Response {
        let code = match self.status {
            "UP" => StatusCode::OK,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        (code, Json(self)).into_response()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new())
}
