//! Cancellation for in-flight analysis requests

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// The guarded future was abandoned because its token was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A cancellation token shared between the workflow and one request task
///
/// The workflow cancels the token when a new selection supersedes the
/// request or the workflow shuts down; the task drops its request future at
/// that point instead of finishing it.
///
/// # Examples
///
/// ```rust
/// use dermassist::workflow::{Cancelled, CancellationToken};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let outcome = token.run_until_cancelled(std::future::pending::<()>()).await;
/// assert_eq!(outcome, Err(Cancelled));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            state: Arc::new(CancellationState { tx, rx }),
        }
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.rx.borrow()
    }

    /// Requests cancellation on every clone of this token
    pub fn cancel(&self) {
        self.state.tx.send_replace(true);
        debug!("Cancellation requested");
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.state.rx.clone();
        // Only fails once the sender is dropped, and `self` holds it.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Drives `future` unless the token is cancelled first
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the token was cancelled before `future`
    /// completed. A token that is already cancelled never polls `future`.
    pub async fn run_until_cancelled<F, T>(&self, future: F) -> Result<T, Cancelled>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Cancelled),
            result = future => Ok(result),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
