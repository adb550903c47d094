use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use health::HealthFlags;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Fail the probes, then hold a grace window so in-flight requests
    /// can finish before the process terminates.
    Graceful,
    /// Fail the probes and terminate without a grace window.
    Immediate,
}

/// Runs the shutdown sequence, decoupled from OS-level process exit:
/// the coordinator only flips the health flags and resolves the serve
/// loop's shutdown future, so the grace-window timing and idempotence
/// are testable without terminating anything.
///
/// Marking the process unhealthy first means health and readiness
/// probes start failing immediately, so orchestrators stop routing new
/// traffic while the grace window drains in-flight requests.
pub struct ShutdownCoordinator {
    flags: HealthFlags,
    grace: Duration,
    started: AtomicBool,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl ShutdownCoordinator {
    pub fn new(flags: HealthFlags, grace: Duration) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            flags,
            grace,
            started: AtomicBool::new(false),
            done_tx,
            done_rx,
        }
    }

    /// Runs the shutdown sequence at most once. A second call (another
    /// signal arriving during the grace window) is a no-op and does not
    /// restart the timer.
    pub async fn shutdown(&self, reason: ShutdownReason) {
        if self.started.swap(true, Ordering::SeqCst) {
            info!("shutdown already in progress, ignoring {:?} request", reason);
            return;
        }

        self.flags.set_healthy(false);

        if reason == ShutdownReason::Graceful {
            info!("draining in-flight requests for {:?}", self.grace);
            tokio::time::sleep(self.grace).await;
        }

        info!("shutdown sequence complete");
        _ = self.done_tx.send(true);
    }

    /// Resolves once the shutdown sequence has finished. The serve loop
    /// selects on this to stop accepting connections.
    pub async fn completed(&self) {
        let mut done = self.done_rx.clone();
        // Err means the coordinator is gone, which also means stop.
        done.wait_for(|finished| *finished).await.ok();
    }
}

/// Maps termination signals onto the coordinator: SIGTERM drains with
/// the grace window, SIGINT stops immediately. Keeps listening so that
/// repeated signals hit the coordinator's idempotence rather than the
/// runtime's default abort.
pub async fn listen_for_signals(coordinator: Arc<ShutdownCoordinator>) {
    let mut term =
        signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    let mut interrupt =
        signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

    loop {
        let reason = tokio::select! {
            _ = term.recv() => {
                info!("SIGTERM received, shutting down gracefully");
                ShutdownReason::Graceful
            }
            _ = interrupt.recv() => {
                info!("SIGINT received, shutting down");
                ShutdownReason::Immediate
            }
        };

        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.shutdown(reason).await });
    }
}
