//! Graceful shutdown.
//!
//! [`ShutdownSignal`] stops the accept loop; [`ConnectionTracker`] lets the
//! server wait for in-flight connections to drain before it returns.
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::with_os_signals();
//! server.run_with_shutdown(shutdown).await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{broadcast, Notify};
use tracing::{error, info};

/// Shared, clonable shutdown trigger.
///
/// ```rust
/// use covenant_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let other = shutdown.clone();
/// other.trigger();
/// assert!(shutdown.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers shutdown. Idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // no receivers is fine
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Returns a future that resolves once shutdown is triggered.
    ///
    /// Resolves immediately if it already was.
    pub fn recv(&self) -> ShutdownReceiver {
        ShutdownReceiver {
            triggered: Arc::clone(&self.triggered),
            receiver: {
                let mut receiver = self.sender.subscribe();
                Box::pin(async move {
                    let _ = receiver.recv().await;
                })
            },
        }
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            match wait_for_os_signal().await {
                Ok(()) => trigger.trigger(),
                Err(e) => error!(error = %e, "failed to listen for shutdown signals"),
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`ShutdownSignal::recv`].
pub struct ShutdownReceiver {
    triggered: Arc<AtomicBool>,
    receiver: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl Future for ShutdownReceiver {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.triggered.load(Ordering::SeqCst) {
            return Poll::Ready(());
        }
        match self.receiver.as_mut().poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down");
    Ok(())
}

/// Counts open connections so shutdown can wait for them.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until every token has been dropped.
    pub async fn drained(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_completes_when_triggered() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[tokio::test]
    async fn test_recv_after_trigger_is_immediate() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[test]
    fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_drained_waits_for_last_token() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        });

        tokio::time::timeout(Duration::from_secs(1), tracker.drained())
            .await
            .expect("drained should complete");
        assert_eq!(tracker.active_connections(), 0);
    }
}
