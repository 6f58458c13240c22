//! Per-call cancellation and deadline.
//!
//! Every ledger operation takes a [`CallContext`]. Blocking storage calls are
//! raced against it, and an atomic unit only commits while the context is
//! still live.

use std::future::{Future, pending};

use tokio::{
    sync::watch,
    time::{Duration, Instant},
};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every [`CallContext`] cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl CallContext {
    /// A context that never expires and cannot be cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(rx),
        };
        (ctx, CancelHandle(tx))
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fails if the context has been cancelled or its deadline has passed.
    pub fn check(&self) -> ResultEngine<()> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled("cancelled by caller".to_string()));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(EngineError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever comes first. The future is dropped in the
    /// latter two cases.
    pub async fn guard<F: Future>(&self, fut: F) -> ResultEngine<F::Output> {
        self.check()?;

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    // A dropped handle can no longer cancel.
                    let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if handle_dropped {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(EngineError::Cancelled("cancelled by caller".to_string())),
            _ = expired => Err(EngineError::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}
