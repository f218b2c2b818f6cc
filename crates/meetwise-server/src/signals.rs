//! Shutdown signaling.
//!
//! A [`ShutdownSignal`] is a cloneable one-shot flag shared between the
//! socket accept loop, the request handler (protocol `Shutdown`), and the
//! OS signal listener (SIGTERM/SIGINT).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, Default)]
struct Inner {
    notify: Notify,
    requested: AtomicBool,
}

/// A cloneable shutdown flag with async wait support.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the signal, waking every waiter. Idempotent.
    pub fn trigger(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true once the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Waits until the signal is triggered. Returns immediately if it
    /// already was.
    pub async fn wait(&self) {
        // Register interest before checking the flag so a trigger between
        // the check and the await is not lost.
        let notified = self.inner.notify.notified();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }
}

/// Spawns a background task that triggers `shutdown` on SIGTERM or SIGINT.
pub fn spawn_signal_listener(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut term = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };
            let mut int = match signal(SignalKind::interrupt()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGINT handler");
                    return;
                }
            };

            tokio::select! {
                _ = term.recv() => info!("SIGTERM received"),
                _ = int.recv() => info!("SIGINT received"),
            }
        }

        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received");
            }
        }

        shutdown.trigger();
    });
}
