//! Cooperative cancellation shared between the runner and a running differ.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DiffError;

/// Shared cancellation signal that long computations poll at safe points.
///
/// Cancelling is a request, not preemption: a differ that never checks the
/// token keeps running until it returns on its own.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Return `Err(DiffError::Cancelled)` once cancellation was requested.
    ///
    /// Intended for `?` at loop heads inside differs.
    pub fn checkpoint(&self) -> Result<(), DiffError> {
        if self.is_cancelled() {
            Err(DiffError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.checkpoint().is_ok());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let worker = token.clone();
        token.cancel();
        assert!(worker.is_cancelled());
        assert_eq!(worker.checkpoint(), Err(DiffError::Cancelled));
    }
}
