//! Per-call cancellation and deadlines.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a call was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interruption {
    Cancelled,
    DeadlineExceeded,
}

/// Cancellation token and deadline attached to one query-interface call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never interrupted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fill in a deadline from `timeout` when none is set.
    pub(crate) fn or_timeout(&self, timeout: Option<Duration>) -> CallContext {
        let mut ctx = self.clone();
        if ctx.deadline.is_none() {
            ctx.deadline = timeout.map(|t| Instant::now() + t);
        }
        ctx
    }

    /// Interruption that has already happened, if any.
    pub(crate) fn check(&self) -> Option<Interruption> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Some(Interruption::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(Interruption::DeadlineExceeded);
        }
        None
    }

    /// Resolves when the call is cancelled or its deadline passes; never otherwise.
    pub(crate) async fn interrupted(&self) -> Interruption {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = cancelled => Interruption::Cancelled,
            _ = expired => Interruption::DeadlineExceeded,
        }
    }
}
