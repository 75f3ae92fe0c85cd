//! Cooperative cancellation token.
//!
//! Cancellation is cooperative, not preemptive: a signalled token only takes
//! effect when the running stage reaches its next `checkpoint()`. Work already
//! handed to the device or filesystem before a checkpoint runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CaptureError;

/// A cloneable cancellation signal shared between the controller and one
/// in-flight capture.
///
/// Clones observe the same underlying flag, so the controller can signal a
/// token it handed to the pipeline earlier.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unsignalled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checkpoint: fail with [`CaptureError::Cancelled`] if the token has
    /// been signalled.
    pub fn checkpoint(&self) -> Result<(), CaptureError> {
        if self.is_cancelled() {
            Err(CaptureError::Cancelled)
        } else {
            Ok(())
        }
    }
}
