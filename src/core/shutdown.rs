//! Shutdown coordination
//!
//! The producer and consumer loops run until told to stop. A
//! [`ShutdownCoordinator`] owns the trigger (signals or an explicit call) and
//! hands out [`ShutdownSignal`] tokens that the loops check at the top of each
//! cycle and race against their pacing sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

/// Cancellation token held by a loop
pub struct ShutdownSignal {
    shutdown_rx: broadcast::Receiver<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Hand out a new cancellation token
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            shutdown_rx: self.shutdown_tx.subscribe(),
            shutdown_requested: self.shutdown_requested.clone(),
        }
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Run a future with process signals wired to the returned token
    ///
    /// SIGINT, SIGTERM, SIGHUP and SIGQUIT request shutdown; a second signal
    /// exits the process immediately with status 130.
    pub async fn guard<F, Fut, R>(future_fn: F) -> R
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let coordinator = Self::new();
        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            coordinator.shutdown_requested.clone(),
        );
        let signal = coordinator.signal();
        future_fn(signal).await
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Non-blocking check used at the top of every loop cycle
    pub fn is_triggered(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown is requested
    ///
    /// A closed or lagged channel counts as a shutdown request.
    pub async fn triggered(&mut self) {
        if self.is_triggered() {
            return;
        }
        let _ = self.shutdown_rx.recv().await;
    }

    /// Sleep for `duration` unless shutdown arrives first
    ///
    /// Returns `true` when the sleep completed, `false` when it was cut short.
    pub async fn sleep(&mut self, duration: std::time::Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        // Restore default SIGPIPE so piping output into `head` ends the process quietly
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::AtomicUsize;
        use tokio::signal::unix::{signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let signals = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                        requested.store(true, Ordering::Release);
                        let _ = tx.send(());
                        if prev >= 1 {
                            log::warn!("Second shutdown signal received; exiting");
                            std::process::exit(130);
                        }
                        log::info!("Shutdown requested; finishing current cycle");
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let mut count = 0;
            while tokio::signal::ctrl_c().await.is_ok() {
                count += 1;
                shutdown_requested.store(true, Ordering::Release);
                let _ = shutdown_tx.send(());
                if count > 1 {
                    std::process::exit(130);
                }
            }
        });
    }
}
