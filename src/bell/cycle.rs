// src/bell/cycle.rs  —  Burst repetition: ring, pause, ring, … done
use crate::bell::pulse::PulseSequencer;
use std::time::{Duration, Instant};

/// Events surfaced to the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingEvent {
    /// A burst finished and the inter-cycle pause began.
    BurstEnded,
    /// The final burst finished. Emitted exactly once per run.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BurstState {
    Ringing,
    Pausing,
    Done,
}

/// Repeats the pulse pattern for `bound` bursts separated by fixed pauses.
///
/// A burst is bounded by a hard duration cap, not by pulse count: even a
/// stuck phase cannot keep a coil energized past `burst_cap`. The invariant
/// `count <= bound` holds throughout; `stop` freezes `count` where it
/// stands, which is how a preempted run stays distinguishable from a
/// completed one.
pub struct CycleController {
    seq:        PulseSequencer,
    bound:      u32,
    ring_pause: Duration,
    burst_cap:  Duration,
    count:      u32,
    state:      BurstState,
    burst_started: Instant,
    pause_started: Instant,
}

impl CycleController {
    pub fn new(seq: PulseSequencer, bound: u32, ring_pause: Duration, burst_cap: Duration) -> Self {
        let now = Instant::now();
        Self {
            seq,
            bound,
            ring_pause,
            burst_cap,
            count: 0,
            state: BurstState::Done,
            burst_started: now,
            pause_started: now,
        }
    }

    /// Arm a fresh run: count reset, first burst begins immediately.
    pub fn start(&mut self, now: Instant) {
        self.count = 0;
        self.state = BurstState::Ringing;
        self.burst_started = now;
        self.seq.start(now);
    }

    pub fn tick(&mut self, now: Instant) -> Option<RingEvent> {
        match self.state {
            BurstState::Ringing => {
                if now.duration_since(self.burst_started) >= self.burst_cap {
                    self.seq.stop();
                    self.finish_burst(now)
                } else {
                    self.seq.tick(now);
                    None
                }
            }
            BurstState::Pausing => {
                if now.duration_since(self.pause_started) >= self.ring_pause {
                    log::debug!("[ring] pause over, burst {} of {}", self.count + 1, self.bound);
                    self.state = BurstState::Ringing;
                    self.burst_started = now;
                    self.seq.start(now);
                }
                None
            }
            BurstState::Done => None,
        }
    }

    /// Preemption: silence the coils immediately, freeze `count`.
    pub fn stop(&mut self) {
        self.seq.stop();
        self.state = BurstState::Done;
    }

    /// Completed bursts so far this run.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.state != BurstState::Done
    }

    fn finish_burst(&mut self, now: Instant) -> Option<RingEvent> {
        self.count += 1;
        log::debug!("[ring] burst {}/{} ended", self.count, self.bound);
        if self.count >= self.bound {
            self.state = BurstState::Done;
            Some(RingEvent::Finished)
        } else {
            self.state = BurstState::Pausing;
            self.pause_started = now;
            Some(RingEvent::BurstEnded)
        }
    }
}
