//! # Fetch Context
//! Cooperative cancellation scope shared by the collector and its fetchers.
//!
//! A context carries an optional cancel signal (process shutdown, caller abort)
//! and an optional deadline. Child contexts only ever tighten the deadline;
//! cancellation of the root reaches every child because they share the same
//! signal.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{CancelReason, FetchError};

#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Owner side of a cancellable context. Dropping it does not cancel.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl FetchContext {
    /// Never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Root context that can be cancelled through the returned handle.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            deadline: None,
        };
        (ctx, CancelHandle { tx })
    }

    /// Child context expiring after `timeout`, or at the parent deadline if
    /// that comes first. A zero timeout inherits the parent deadline only.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            return self.clone();
        }
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent <= deadline => parent,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Reason the context is done, if it is.
    pub fn err(&self) -> Option<CancelReason> {
        if let Some(rx) = &self.cancel {
            if *rx.borrow() {
                return Some(CancelReason::Cancelled);
            }
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// `Err(FetchError::Cancelled)` once the context is done.
    pub fn check(&self) -> Result<(), FetchError> {
        match self.err() {
            Some(reason) => Err(FetchError::Cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    let fired = rx.wait_for(|c| *c).await.is_ok();
                    if !fired {
                        // sender gone without cancelling: never fires
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = cancelled => {}
            _ = expired => {}
        }
    }

    /// Drive `fut` until it finishes or the context is done, whichever is first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, FetchError> {
        self.check()?;
        tokio::select! {
            out = fut => Ok(out),
            _ = self.done() => Err(FetchError::Cancelled(
                self.err().unwrap_or(CancelReason::DeadlineExceeded),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_never_done() {
        let ctx = FetchContext::background();
        assert!(ctx.err().is_none());
        let r = tokio::time::timeout(Duration::from_millis(20), ctx.done()).await;
        assert!(r.is_err(), "background context must not resolve");
    }

    #[tokio::test]
    async fn cancel_reaches_children() {
        let (root, handle) = FetchContext::cancellable();
        let child = root.with_timeout(Duration::from_secs(30));
        assert!(child.check().is_ok());

        handle.cancel();
        assert_eq!(child.err(), Some(CancelReason::Cancelled));
        tokio::time::timeout(Duration::from_millis(100), child.done())
            .await
            .expect("child must observe root cancellation");
    }

    #[tokio::test]
    async fn child_deadline_never_extends_parent() {
        let parent = FetchContext::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let zero = parent.with_timeout(Duration::ZERO);
        assert_eq!(zero.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn run_stops_at_deadline() {
        let ctx = FetchContext::background().with_timeout(Duration::from_millis(20));
        let res = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        match res {
            Err(FetchError::Cancelled(CancelReason::DeadlineExceeded)) => {}
            other => panic!("expected deadline, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_fails_fast_when_already_cancelled() {
        let (ctx, handle) = FetchContext::cancellable();
        handle.cancel();
        let res = ctx.run(async { 42 }).await;
        assert!(matches!(res, Err(FetchError::Cancelled(CancelReason::Cancelled))));
    }
}
