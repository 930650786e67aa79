//! Trailing-edge debounce timer
//!
//! Collapses a burst of triggers (scroll and resize floods, zoom stepping)
//! into one deferred task that becomes due `delay` after the last trigger.
//! The timer never reads the clock itself: the event loop passes `now` to
//! [`DebounceTimer::schedule`] and [`DebounceTimer::poll`].

use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;

/// Default quiet interval before a deferred render runs
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(130);

/// Handle to one armed timer
///
/// The handle stays valid after the timer is superseded; its token then
/// reports cancelled.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    token: CancellationToken,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` if the timer was re-armed or cancelled before firing
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct PendingTimer<T> {
    id: u64,
    deadline: Instant,
    token: CancellationToken,
    task: T,
}

/// Single-slot cancellable delayed task
///
/// At most one timer is outstanding. Arming a new one cancels the previous
/// one, so a burst of `schedule` calls closer together than `delay` yields
/// the task exactly once, `delay` after the last call.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use viewer_scheduler::DebounceTimer;
///
/// let mut timer = DebounceTimer::new(Duration::from_millis(130));
/// let start = Instant::now();
///
/// timer.schedule(start, "render");
/// timer.schedule(start + Duration::from_millis(50), "render");
///
/// assert_eq!(timer.poll(start + Duration::from_millis(130)), None);
/// assert_eq!(timer.poll(start + Duration::from_millis(180)), Some("render"));
/// assert_eq!(timer.poll(start + Duration::from_millis(500)), None);
/// ```
#[derive(Debug)]
pub struct DebounceTimer<T> {
    delay: Duration,
    next_id: u64,
    pending: Option<PendingTimer<T>>,
}

impl<T> DebounceTimer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, next_id: 1, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the quiet interval; an already armed deadline is left as is
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Arm the timer for `now + delay`, replacing any pending task
    pub fn schedule(&mut self, now: Instant, task: T) -> TimerHandle {
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
            tracing::trace!(timer = previous.id, "debounce timer superseded");
        }

        let id = self.next_id;
        self.next_id += 1;

        let token = CancellationToken::new();
        let deadline = now + self.delay;
        self.pending = Some(PendingTimer { id, deadline, token: token.clone(), task });

        tracing::trace!(timer = id, delay_ms = self.delay.as_millis() as u64, "debounce timer armed");

        TimerHandle { id, token }
    }

    /// Cancel the pending timer, if any
    ///
    /// Returns `true` if a timer was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel the timer only if `handle` still refers to the armed one
    pub fn cancel_handle(&mut self, handle: &TimerHandle) -> bool {
        let matches = self.pending.as_ref().is_some_and(|pending| pending.id == handle.id);

        if matches {
            self.cancel()
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// Take the task if its deadline has passed
    ///
    /// Returns the task exactly once per armed timer.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }

        let pending = self.pending.take()?;
        tracing::trace!(timer = pending.id, "debounce timer fired");
        Some(pending.task)
    }
}

impl<T> Default for DebounceTimer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn burst_collapses_into_one_firing_after_last_call() {
        let mut timer = DebounceTimer::new(ms(130));
        let start = Instant::now();

        // Triggers every 50ms for 450ms, polled every 10ms
        let mut fired = Vec::new();
        for tick in (0..=800).step_by(10) {
            let now = start + ms(tick);
            if tick % 50 == 0 && tick <= 450 {
                timer.schedule(now, tick);
            }
            if let Some(task) = timer.poll(now) {
                fired.push((tick, task));
            }
        }

        assert_eq!(fired, vec![(580, 450)]);
        assert!(!timer.is_pending());
    }

    #[test]
    fn fires_after_quiet_interval() {
        let mut timer = DebounceTimer::new(ms(200));
        let start = Instant::now();

        timer.schedule(start, ());
        assert_eq!(timer.deadline(), Some(start + ms(200)));
        assert!(timer.poll(start + ms(199)).is_none());
        assert!(timer.poll(start + ms(200)).is_some());
        assert!(timer.poll(start + ms(400)).is_none());
    }

    #[test]
    fn rearming_cancels_previous_handle() {
        let mut timer = DebounceTimer::new(ms(130));
        let start = Instant::now();

        let first = timer.schedule(start, ());
        let second = timer.schedule(start + ms(10), ());

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut timer = DebounceTimer::new(ms(130));
        let start = Instant::now();

        let handle = timer.schedule(start, ());
        assert!(timer.cancel());
        assert!(handle.is_cancelled());
        assert!(timer.poll(start + ms(1000)).is_none());
        assert!(!timer.cancel());
    }

    #[test]
    fn stale_handle_does_not_cancel_current_timer() {
        let mut timer = DebounceTimer::new(ms(130));
        let start = Instant::now();

        let stale = timer.schedule(start, 1);
        let current = timer.schedule(start + ms(20), 2);

        assert!(!timer.cancel_handle(&stale));
        assert!(timer.is_pending());
        assert!(timer.cancel_handle(&current));
        assert!(!timer.is_pending());
    }

    #[test]
    fn set_delay_applies_to_next_schedule() {
        let mut timer = DebounceTimer::<()>::default();
        assert_eq!(timer.delay(), DEFAULT_DEBOUNCE_DELAY);

        timer.set_delay(ms(50));
        let start = Instant::now();
        timer.schedule(start, ());
        assert_eq!(timer.deadline(), Some(start + ms(50)));
    }
}
