//! Viewer Scheduler Library
//!
//! Deferred render scheduling for the paged document viewer.
//!
//! Scroll and resize events arrive far faster than a virtualization pass
//! should run. [`DebounceTimer`] holds a single pending task and re-arms on
//! every trigger, so the pass runs once the input goes quiet.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use viewer_scheduler::DebounceTimer;
//!
//! let mut timer = DebounceTimer::new(Duration::from_millis(130));
//! let now = Instant::now();
//!
//! let handle = timer.schedule(now, ());
//! assert!(timer.is_pending());
//!
//! // A new trigger supersedes the old timer
//! timer.schedule(now + Duration::from_millis(40), ());
//! assert!(handle.is_cancelled());
//! ```

mod cancel;
mod debounce;

// Re-export public API
pub use cancel::CancellationToken;
pub use debounce::{DebounceTimer, TimerHandle, DEFAULT_DEBOUNCE_DELAY};
