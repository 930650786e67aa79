//! Cancellation tokens for armed timers
//!
//! Every armed timer hands out a token. Re-arming or cancelling the timer
//! flips the token, so whoever still holds the handle of a superseded timer
//! can observe that it will never fire.

use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation flag for a single armed timer
///
/// Clones share state. The scheduler runs on one event loop, so the flag is
/// an `Rc<Cell<bool>>` rather than an atomic.
///
/// # Example
///
/// ```
/// use viewer_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let observer = token.clone();
///
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self { cancelled: Rc::new(Cell::new(false)) }
    }

    /// Cancel this token
    ///
    /// All clones observe the cancellation. Calling it twice is harmless.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Returns `true` once `cancel()` has been called on this token or any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Returns `true` if both tokens share the same flag
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
