//! Request-scoped cancellation
//!
//! A [`RequestContext`] is passed explicitly into every storage and service
//! call. It combines a cooperative cancellation token with an optional
//! deadline. Work observes it only at checkpoints (`check`), so a signal that
//! fires between two checkpoints takes effect at the next one.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{Error, Result};

/// Cancellation signal with an optional deadline
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Wrap an existing token (e.g. the server's shutdown token)
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context sharing this context's deadline.
    ///
    /// Cancelling the child leaves the parent untouched; cancelling the
    /// parent cancels the child.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that expires at `deadline`, or at the parent's
    /// deadline if that one comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that expires `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Trigger cancellation for this context and its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Guard that cancels this context when dropped.
    ///
    /// Hold it for as long as the work that owns the context is alive.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Checkpoint: fail if the context is cancelled or past its deadline.
    ///
    /// Explicit cancellation wins over a lapsed deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the token fires or the deadline elapses
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Sleep for `duration` unless the context ends first.
    ///
    /// A zero duration is just a checkpoint.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return self.check();
        }
        self.check()?;

        tokio::select! {
            _ = tokio::time::sleep(duration) => self.check(),
            _ = self.done() => match self.check() {
                Err(e) => Err(e),
                Ok(()) => Err(Error::Cancelled),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_never_done() {
        let ctx = RequestContext::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_reports_cancelled() {
        let ctx = RequestContext::background();
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_child_follows_parent_but_not_reverse() {
        let parent = RequestContext::background();
        let first = parent.child();
        let second = parent.child();

        first.cancel();
        assert!(first.check().is_err());
        assert!(parent.check().is_ok());
        assert!(second.check().is_ok());

        parent.cancel();
        assert!(matches!(second.check(), Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_deadline_exceeded() {
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(2));
        assert!(ctx.check().is_ok());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(matches!(ctx.check(), Err(Error::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_cancel_wins_over_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_never_outlives_parent() {
        let parent = RequestContext::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(100));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_within_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(2));
        ctx.sleep(Duration::from_millis(200)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_past_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(2));
        let started = Instant::now();

        let result = ctx.sleep(Duration::from_secs(5)).await;

        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_cancel() {
        let ctx = RequestContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = ctx.sleep(Duration::from_secs(10)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_zero_sleep_is_checkpoint() {
        let ctx = RequestContext::background();
        ctx.sleep(Duration::ZERO).await.unwrap();

        ctx.cancel();
        assert!(matches!(
            ctx.sleep(Duration::ZERO).await,
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_drop_guard_cancels() {
        let ctx = RequestContext::background().child();
        {
            let _guard = ctx.drop_guard();
            assert!(ctx.check().is_ok());
        }
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }
}
