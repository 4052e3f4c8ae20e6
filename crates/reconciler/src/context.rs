//! Cancellation and deadline carried through one reconciliation pass.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, Stage};

/// Caller-supplied cancellation signal and optional deadline for a pass.
///
/// Every external call of the pass runs under [`PassContext::guard`]; a
/// cancelled token or an elapsed deadline aborts the in-flight call.
#[derive(Debug, Clone, Default)]
pub struct PassContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl PassContext {
    /// Context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `token` as the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Abort calls still in flight at `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Copy of this context whose deadline is at most `timeout` from now.
    #[must_use]
    pub fn bounded_by(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };
        Self {
            cancel: self.cancel.clone(),
            deadline,
        }
    }

    /// The cancellation signal.
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `call` unless the pass is cancelled or its deadline elapses first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] or [`Error::DeadlineExceeded`] tagged with `stage`.
    pub async fn guard<T, F>(&self, stage: Stage, call: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled { stage });
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled { stage }),
            () = deadline => Err(Error::DeadlineExceeded { stage }),
            output = call => Ok(output),
        }
    }
}
