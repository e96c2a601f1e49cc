//! Cancellation for long-running builds
//!
//! Builds are single-threaded, but the signal to stop can come from anywhere (a signal
//! handler, a supervising thread). The token is checked before each descriptor and each
//! chunk; a tripped token aborts the build with [`PackError::Cancelled`].

use crate::error::PackError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`PackError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<(), PackError> {
        if self.is_cancelled() {
            return Err(PackError::Cancelled);
        }
        Ok(())
    }
}
