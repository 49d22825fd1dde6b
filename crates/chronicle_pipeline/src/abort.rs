//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Handlers poll it right after each external call returns and stop before
/// persisting anything.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::AbortSignal;
///
/// let signal = AbortSignal::new();
/// let handle = signal.clone();
/// assert!(!signal.is_aborted());
/// handle.abort();
/// assert!(signal.is_aborted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
