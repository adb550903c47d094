pub mod api;
pub mod config;
pub mod loader;
pub mod metrics_middleware;
pub mod prometheus;
pub mod router;
pub mod seed;
pub mod server;
pub mod shutdown;
pub mod store;
