//! Cooperative cancellation for long-running cleaves.

#[cfg(test)]
use std::sync::atomic::AtomicUsize;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{Result, error::CleaveError};

/// Shared flag the service layer flips to abandon an in-flight cleave.
///
/// The engine only polls the flag between stages and periodically during the
/// union pass; nothing outside the request is mutated, so an abandoned cleave
/// needs no rollback.
///
/// # Examples
/// ```
/// use cleave_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    /// Polls left before the token cancels itself.
    #[cfg(test)]
    polls_left: Option<Arc<AtomicUsize>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every cleave observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Builds a token that passes `polls` checks and cancels on the next.
    #[cfg(test)]
    pub(crate) fn cancel_after_polls(polls: usize) -> Self {
        Self {
            cancelled: Arc::default(),
            polls_left: Some(Arc::new(AtomicUsize::new(polls))),
        }
    }

    pub(crate) fn check(&self, stage: &'static str) -> Result<()> {
        #[cfg(test)]
        self.count_poll();
        if self.is_cancelled() {
            return Err(CleaveError::Cancelled { stage });
        }
        Ok(())
    }

    #[cfg(test)]
    fn count_poll(&self) {
        let Some(polls_left) = &self.polls_left else {
            return;
        };
        let exhausted = polls_left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
            .is_err();
        if exhausted {
            self.cancel();
        }
    }
}
