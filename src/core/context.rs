//! Per-call cancellation and deadlines.
//!
//! Every operation that may reach the network takes a [`Context`]. A caller
//! can cancel it explicitly through a [`CancelHandle`], give it a deadline,
//! or both. Operations race their I/O against [`Context::done`].

use futures::future::select_all;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels every [`Context`] derived from the one that created it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace does not fail when every receiver is gone
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a child context plus the handle that cancels it.
    ///
    /// The child keeps this context's deadline and is also done when any of
    /// its ancestors is cancelled. The new handle does not reach the parent.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel.push(receiver);
        (self, CancelHandle { sender })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        let cancelled = self.cancel.iter().any(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        cancelled || expired
    }

    /// Resolves once the context is cancelled or its deadline passes.
    /// Never resolves for a background context.
    pub async fn done(&self) {
        let cancelled = async {
            if self.cancel.is_empty() {
                std::future::pending::<()>().await;
            }
            let waiters = self
                .cancel
                .iter()
                .map(|rx| Box::pin(wait_cancelled(rx.clone())));
            select_all(waiters).await;
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancelled => {}
            _ = expired => {}
        }
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
    // A dropped handle can no longer cancel anything.
    if handle_dropped {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_context_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());

        let finished = tokio::time::timeout(Duration::from_millis(20), ctx.done()).await;
        assert!(finished.is_err());
    }

    #[tokio::test]
    async fn test_cancel_handle_wakes_waiters() {
        let (ctx, handle) = Context::background().with_cancel();
        assert!(!ctx.is_done());

        let waiter = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.done().await }
        });
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("done() should resolve after cancel")
            .unwrap();
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_done());

        ctx.done().await;
        assert!(ctx.is_done());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);

        let ctx = Context::background().with_deadline(soon).with_deadline(later);
        assert_eq!(ctx.deadline(), Some(soon));
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let (parent, parent_handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.clone().with_cancel();

        let waiter = tokio::spawn({
            let child = child.clone();
            async move { child.done().await }
        });
        parent_handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("child should be done once its parent is cancelled")
            .unwrap();
        assert!(parent.is_done());
        assert!(child.is_done());
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_reach_parent() {
        let (parent, _parent_handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.clone().with_cancel();

        child_handle.cancel();

        assert!(child.is_done());
        assert!(!parent.is_done());
        let finished = tokio::time::timeout(Duration::from_millis(20), parent.done()).await;
        assert!(finished.is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        drop(handle);

        let finished = tokio::time::timeout(Duration::from_millis(20), ctx.done()).await;
        assert!(finished.is_err());
        assert!(!ctx.is_done());
    }
}
