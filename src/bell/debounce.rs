// src/bell/debounce.rs  —  Switch debouncing (timestamp-window policy)
use std::time::{Duration, Instant};

/// Filters the raw switch level into a stable logical level.
///
/// The stable level only follows the raw input after the input has held a
/// new value for the full debounce window, so contact chatter faster than
/// the window never gets through. This is the one place in the controller
/// that deliberately lags the hardware.
///
/// Edge detection is the caller's job: compare successive return values
/// of [`update`](Debouncer::update).
pub struct Debouncer {
    window:      Duration,
    last_raw:    bool,
    last_change: Instant,
    stable:      bool,
}

impl Debouncer {
    /// `rest` is the electrical level of the unpressed switch.
    pub fn new(window: Duration, rest: bool, now: Instant) -> Self {
        Self {
            window,
            last_raw:    rest,
            last_change: now,
            stable:      rest,
        }
    }

    /// Sample the raw level. Never blocks, no error cases.
    pub fn update(&mut self, raw: bool, now: Instant) -> bool {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
        }
        if now.duration_since(self.last_change) >= self.window {
            self.stable = self.last_raw;
        }
        self.stable
    }

    pub fn stable(&self) -> bool {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(10);

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn held_level_promotes_after_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, true, t0);

        assert!(d.update(false, at(t0, 0)));
        assert!(d.update(false, at(t0, 5)));
        // Window elapsed: the new level is trusted
        assert!(!d.update(false, at(t0, 10)));
    }

    #[test]
    fn chatter_faster_than_window_never_changes_stable() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, true, t0);

        // Toggle every 3 ms for 100 ms: each flip restarts the window
        let mut level = false;
        for ms in (0..100).step_by(3) {
            assert!(d.update(level, at(t0, ms)), "chatter leaked at {ms} ms");
            level = !level;
        }
    }

    #[test]
    fn stable_changes_at_most_once_per_held_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, true, t0);

        let mut changes = 0;
        let mut prev = d.stable();
        for ms in 0..40 {
            let s = d.update(false, at(t0, ms));
            if s != prev {
                changes += 1;
            }
            prev = s;
        }
        assert_eq!(changes, 1);
    }

    #[test]
    fn release_debounces_like_press() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW, true, t0);

        d.update(false, at(t0, 0));
        d.update(false, at(t0, 10));
        assert!(!d.stable());

        // Bounce on release, then hold
        d.update(true, at(t0, 20));
        d.update(false, at(t0, 24));
        d.update(true, at(t0, 27));
        assert!(!d.update(true, at(t0, 33)));
        assert!(d.update(true, at(t0, 37)));
    }
}
