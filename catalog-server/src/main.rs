use std::sync::Arc;
use std::time::Duration;

use envconfig::Envconfig;
use health::HealthFlags;

use catalog::config::Config;
use catalog::loader;
use catalog::prometheus::setup_metrics_recorder;
use catalog::router::router;
use catalog::seed::SeedData;
use catalog::server::serve;
use catalog::shutdown::{listen_for_signals, ShutdownCoordinator};
use catalog::store::PgStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("invalid configuration");
    let flags = HealthFlags::new();

    // Strict startup order: without a data store there is nothing
    // useful to serve, so a connect failure exits before any listener
    // starts.
    let store = match PgStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            flags.set_healthy(false);
            tracing::error!("failed to connect to database: {}", err);
            std::process::exit(1);
        }
    };
    tracing::info!("successfully connected to database");

    let address = config.address().expect("invalid listen address");
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .expect("could not bind listen address");

    let coordinator = Arc::new(ShutdownCoordinator::new(
        flags.clone(),
        Duration::from_secs(config.shutdown_grace_secs),
    ));
    tokio::spawn(listen_for_signals(coordinator.clone()));

    // Seed in the background: the listener serves right away while
    // readiness stays false, so orchestrators hold back real traffic
    // until the catalog is loaded.
    {
        let store = store.clone();
        let flags = flags.clone();
        tokio::spawn(async move {
            loader::initialize(store.as_ref(), &SeedData::builtin(), &flags).await;
        });
    }

    let recorder_handle = config.export_prometheus.then(setup_metrics_recorder);
    let app = router(store, flags, recorder_handle);

    let shutdown = {
        let coordinator = coordinator.clone();
        async move { coordinator.completed().await }
    };
    serve(app, listener, shutdown).await;

    tracing::info!("process exiting");
}
