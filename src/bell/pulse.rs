// src/bell/pulse.rs  —  Four-phase pulse drive for the two ringer coils
use crate::gpio::OutputLine;
use std::time::{Duration, Instant};

/// One ring pulse: coil A energized, gap, coil B energized, gap, repeat.
/// The two coils throw and return the hammer, so the pattern is asymmetric
/// and the gaps keep the drive stage out of shoot-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulsePhase {
    CoilA,
    GapA,
    CoilB,
    GapB,
}

impl PulsePhase {
    fn next(self) -> Self {
        match self {
            PulsePhase::CoilA => PulsePhase::GapA,
            PulsePhase::GapA  => PulsePhase::CoilB,
            PulsePhase::CoilB => PulsePhase::GapB,
            PulsePhase::GapB  => PulsePhase::CoilA,
        }
    }
}

/// Per-phase drive durations. Both gaps share one duration; the coil
/// on-times differ (strike vs return).
#[derive(Debug, Clone, Copy)]
pub struct PulseTiming {
    pub coil_a: Duration,
    pub coil_b: Duration,
    pub gap:    Duration,
}

impl PulseTiming {
    pub fn duration_of(&self, phase: PulsePhase) -> Duration {
        match phase {
            PulsePhase::CoilA => self.coil_a,
            PulsePhase::CoilB => self.coil_b,
            PulsePhase::GapA | PulsePhase::GapB => self.gap,
        }
    }
}

/// Drives the two coil lines through the cyclic pulse pattern.
///
/// `tick` tolerates arbitrarily late calls: elapsed whole phases are
/// consumed until the current phase is the one `now` falls inside, so
/// scheduling jitter shifts the pattern instead of erroring. A coil is
/// never left asserted past its phase duration plus one tick of lag.
pub struct PulseSequencer {
    line_a: Box<dyn OutputLine>,
    line_b: Box<dyn OutputLine>,
    timing: PulseTiming,
    phase:  PulsePhase,
    phase_started: Instant,
    active: bool,
}

impl PulseSequencer {
    pub fn new(line_a: Box<dyn OutputLine>, line_b: Box<dyn OutputLine>, timing: PulseTiming) -> Self {
        let mut s = Self {
            line_a,
            line_b,
            timing,
            phase: PulsePhase::GapB,
            phase_started: Instant::now(),
            active: false,
        };
        s.line_a.set_low();
        s.line_b.set_low();
        s
    }

    /// Begin the pattern at CoilA.
    pub fn start(&mut self, now: Instant) {
        self.phase_started = now;
        self.active = true;
        self.enter(PulsePhase::CoilA);
    }

    /// Advance to whichever phase `now` falls in. Repeated calls with the
    /// same `now` do not advance twice. No-op while stopped.
    pub fn tick(&mut self, now: Instant) -> PulsePhase {
        if !self.active {
            return self.phase;
        }
        let mut dur = self.timing.duration_of(self.phase);
        while now.duration_since(self.phase_started) >= dur {
            // Overrun counts as "phase elapsed", never as an error
            self.phase_started += dur;
            self.enter(self.phase.next());
            dur = self.timing.duration_of(self.phase);
        }
        self.phase
    }

    /// Deassert both lines unconditionally and go inactive. Callable from
    /// any phase; this is the preemption hook.
    pub fn stop(&mut self) {
        self.line_a.set_low();
        self.line_b.set_low();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> PulsePhase {
        self.phase
    }

    fn enter(&mut self, phase: PulsePhase) {
        // Order matters: the finished coil drops before the next one rises,
        // so A and B are never high together.
        match phase {
            PulsePhase::CoilA => {
                self.line_b.set_low();
                self.line_a.set_high();
            }
            PulsePhase::GapA => {
                self.line_a.set_low();
            }
            PulsePhase::CoilB => {
                self.line_a.set_low();
                self.line_b.set_high();
            }
            PulsePhase::GapB => {
                self.line_b.set_low();
            }
        }
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct TestLine(Arc<AtomicBool>);

    impl OutputLine for TestLine {
        fn set_high(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
        fn set_low(&mut self) {
            self.0.store(false, Ordering::SeqCst);
        }
        fn is_high(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    // coil A 5 ms, gap 3 ms, coil B 4 ms, gap 3 ms  →  15 ms per full pulse
    const TIMING: PulseTiming = PulseTiming {
        coil_a: Duration::from_millis(5),
        coil_b: Duration::from_millis(4),
        gap:    Duration::from_millis(3),
    };

    fn sequencer() -> (PulseSequencer, Arc<AtomicBool>, Arc<AtomicBool>) {
        let a = Arc::new(AtomicBool::new(false));
        let b = Arc::new(AtomicBool::new(false));
        let seq = PulseSequencer::new(
            Box::new(TestLine(Arc::clone(&a))),
            Box::new(TestLine(Arc::clone(&b))),
            TIMING,
        );
        (seq, a, b)
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn start_asserts_coil_a_only() {
        let (mut seq, a, b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);
        assert_eq!(seq.phase(), PulsePhase::CoilA);
        assert!(a.load(Ordering::SeqCst));
        assert!(!b.load(Ordering::SeqCst));
    }

    #[test]
    fn phases_advance_on_schedule() {
        let (mut seq, a, b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);

        assert_eq!(seq.tick(at(t0, 4)), PulsePhase::CoilA);
        assert_eq!(seq.tick(at(t0, 5)), PulsePhase::GapA);
        assert!(!a.load(Ordering::SeqCst));
        assert_eq!(seq.tick(at(t0, 8)), PulsePhase::CoilB);
        assert!(b.load(Ordering::SeqCst));
        assert_eq!(seq.tick(at(t0, 12)), PulsePhase::GapB);
        assert!(!b.load(Ordering::SeqCst));
        // Wraps back around
        assert_eq!(seq.tick(at(t0, 15)), PulsePhase::CoilA);
        assert!(a.load(Ordering::SeqCst));
    }

    #[test]
    fn tick_is_idempotent_at_the_same_instant() {
        let (mut seq, _a, _b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);

        // 5 ms = exactly one elapsed CoilA phase
        assert_eq!(seq.tick(at(t0, 5)), PulsePhase::GapA);
        assert_eq!(seq.tick(at(t0, 5)), PulsePhase::GapA);
        assert_eq!(seq.tick(at(t0, 5)), PulsePhase::GapA);
    }

    #[test]
    fn huge_delta_converges_to_the_right_phase() {
        let (mut seq, a, b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);

        // 10 full pulses (150 ms) plus 10 ms lands inside CoilB
        assert_eq!(seq.tick(at(t0, 160)), PulsePhase::CoilB);
        assert!(!a.load(Ordering::SeqCst));
        assert!(b.load(Ordering::SeqCst));
    }

    #[test]
    fn lines_are_never_both_high() {
        let (mut seq, a, b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);

        for ms in 0..120 {
            seq.tick(at(t0, ms));
            assert!(
                !(a.load(Ordering::SeqCst) && b.load(Ordering::SeqCst)),
                "both coils driven at {ms} ms"
            );
        }
    }

    #[test]
    fn stop_forces_both_lines_low_from_any_phase() {
        for stop_ms in [2u64, 6, 9, 13] {
            let (mut seq, a, b) = sequencer();
            let t0 = Instant::now();
            seq.start(t0);
            seq.tick(at(t0, stop_ms));
            seq.stop();
            assert!(!a.load(Ordering::SeqCst));
            assert!(!b.load(Ordering::SeqCst));
            assert!(!seq.is_active());
        }
    }

    #[test]
    fn tick_while_stopped_does_nothing() {
        let (mut seq, a, b) = sequencer();
        let t0 = Instant::now();
        seq.start(t0);
        seq.stop();
        seq.tick(at(t0, 50));
        assert!(!a.load(Ordering::SeqCst));
        assert!(!b.load(Ordering::SeqCst));
    }
}
