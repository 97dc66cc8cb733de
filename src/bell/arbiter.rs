// src/bell/arbiter.rs  —  Top-level Idle / Ringing / Playing state machine
use crate::bell::cycle::{CycleController, RingEvent};
use crate::bell::debounce::Debouncer;
use crate::config::AppConfig;
use crate::playback::ClipPlayer;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Owned and mutated only by the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Ringing,
    Playing,
}

/// The controller proper: wall-clock triggering, switch preemption, and the
/// hand-off between ringing and clip playback.
///
/// Per-tick order is fixed: the switch is debounced first, then the current
/// mode is dispatched, then sub-state advances. A press seen this tick
/// therefore silences the coils before any further line toggling.
///
/// Every transition into Idle resets the trigger timer, so the ring
/// interval measures from the end of the previous activity. The trigger
/// check lives only in the Idle arm; a trigger while Ringing or Playing
/// is structurally impossible rather than a skipped case.
pub struct ModeArbiter {
    mode:  Mode,
    cycle: CycleController,
    debounce:    Debouncer,
    prev_stable: bool,
    /// Electrical level of a pressed switch (wiring polarity)
    active_level:  bool,
    ring_interval: Duration,
    last_trigger:  Instant,
    files:    Vec<String>,
    selected: Option<String>,
    rng: SmallRng,
}

impl ModeArbiter {
    pub fn new(cycle: CycleController, files: Vec<String>, cfg: &AppConfig, now: Instant) -> Self {
        let active_level = !cfg.switch_active_low;
        let rest = !active_level;
        Self {
            mode: Mode::Idle,
            cycle,
            debounce: Debouncer::new(Duration::from_millis(cfg.debounce_ms), rest, now),
            prev_stable: rest,
            active_level,
            ring_interval: Duration::from_millis(cfg.interval_ms),
            last_trigger: now,
            files,
            selected: None,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// One control-loop pass. `raw_switch` is the unfiltered input level.
    ///
    /// While Playing this calls [`ClipPlayer::play`], which blocks for the
    /// whole clip; the switch is not sampled again until it returns.
    pub fn tick(&mut self, now: Instant, raw_switch: bool, player: &mut dyn ClipPlayer) {
        let stable = self.debounce.update(raw_switch, now);
        let pressed = stable != self.prev_stable && stable == self.active_level;
        self.prev_stable = stable;

        match self.mode {
            Mode::Idle => {
                if now.duration_since(self.last_trigger) >= self.ring_interval
                    && stable != self.active_level
                {
                    self.selected = self.files.choose(&mut self.rng).cloned();
                    match &self.selected {
                        Some(name) => log::info!("[chime] ring, clip armed: {name}"),
                        None => log::info!("[chime] ring, no clips available"),
                    }
                    self.cycle.start(now);
                    self.set_mode(Mode::Ringing);
                }
            }
            Mode::Ringing => {
                if pressed {
                    // Preemption: coils drop before anything else happens
                    self.cycle.stop();
                    log::info!("[chime] preempted after {} burst(s)", self.cycle.count());
                    self.set_mode(Mode::Playing);
                } else if let Some(RingEvent::Finished) = self.cycle.tick(now) {
                    self.last_trigger = now;
                    self.set_mode(Mode::Idle);
                }
            }
            Mode::Playing => {
                // With no clip selected this mode is a single no-op pass.
                if let Some(name) = self.selected.take() {
                    if let Err(e) = player.play(&name) {
                        log::warn!("[chime] playback of {name} failed: {e}");
                    }
                }
                self.last_trigger = now;
                self.set_mode(Mode::Idle);
            }
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        log::info!("[chime] {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }
}
