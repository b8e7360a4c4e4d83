//! Rich-text editor readiness
//!
//! Capture is only trustworthy once the editor has populated its content.
//! The wait is bounded: a widget that never reports ready must not hang
//! setup.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

/// Signal that field capture can be trusted
#[async_trait]
pub trait EditorReadiness: Send + Sync {
    /// Resolve once the editor is ready
    async fn ready(&self);
}

/// Page without a rich-text editor
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl EditorReadiness for AlwaysReady {
    async fn ready(&self) {}
}

/// Sending half of a readiness signal, held by the editor integration
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

/// Receiving half of a readiness signal, handed to the engine
#[derive(Debug, Clone)]
pub struct ReadyWaiter {
    rx: watch::Receiver<bool>,
}

impl ReadySignal {
    /// Create an unsignalled pair
    #[must_use]
    pub fn new() -> (Self, ReadyWaiter) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ReadyWaiter { rx })
    }

    /// Report the editor ready
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }
}

#[async_trait]
impl EditorReadiness for ReadyWaiter {
    async fn ready(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|ready| *ready).await.is_err();
        if closed {
            // Editor went away without reporting; only the ceiling ends this.
            std::future::pending::<()>().await;
        }
    }
}

/// Wait for readiness up to `ceiling`; `false` means the ceiling was hit
pub async fn wait_for_editor(readiness: &dyn EditorReadiness, ceiling: Duration) -> bool {
    if tokio::time::timeout(ceiling, readiness.ready()).await.is_ok() {
        true
    } else {
        tracing::warn!(
            "Editor not ready after {}s, capturing anyway",
            ceiling.as_secs()
        );
        false
    }
}
