use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use metrics::gauge;
use tokio::net::TcpListener;
use tower::Service;

use crate::prometheus::METRIC_ACTIVE_CONNECTIONS;

// Global atomic count of open transport connections
static ACTIVE_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

/// One guard per accepted connection: increments the gauge when the
/// connection is accepted, decrements exactly once when the serving
/// task finishes, even if it panics.
struct ConnectionGuard;

impl ConnectionGuard {
    fn open() -> Self {
        let connections = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!(METRIC_ACTIVE_CONNECTIONS).set(connections as f64);
        ConnectionGuard
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connections = ACTIVE_CONNECTIONS
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        gauge!(METRIC_ACTIVE_CONNECTIONS).set(connections as f64);
    }
}

pub fn active_connections() -> usize {
    ACTIVE_CONNECTIONS.load(Ordering::Relaxed)
}

/// Accepts connections and serves the router until the shutdown future
/// resolves. The listener is already bound by the caller, so traffic is
/// accepted as soon as this runs; readiness gating is left to external
/// orchestrators consulting the probes.
pub async fn serve<F>(app: Router, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("product service listening on {}", addr);
    }

    let builder = AutoBuilder::new(TokioExecutor::new());

    // Pin the shutdown future so we can poll it in the select loop
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, _remote_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("failed to accept connection: {}", e);
                        continue;
                    }
                };

                // Match axum default: set TCP_NODELAY for low-latency
                if let Err(e) = socket.set_nodelay(true) {
                    tracing::warn!("failed to set TCP_NODELAY: {}", e);
                }

                let guard = ConnectionGuard::open();

                let app = app.clone();
                let service = hyper::service::service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let mut app = app.clone();
                    let req = req.map(axum::body::Body::new);
                    async move { app.call(req).await }
                });

                // Serve the connection with HTTP/1 + HTTP/2 auto-detection and upgrade support
                let conn = builder.serve_connection_with_upgrades(
                    TokioIo::new(socket),
                    service,
                );
                let conn = conn.into_owned();

                tokio::spawn(async move {
                    let _guard = guard;
                    if let Err(e) = conn.await {
                        tracing::debug!("connection closed: {}", e);
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown sequence finished, stopping accept loop");
                break;
            }
        }
    }
}
