// src/gpio/mod.rs  —  Digital I/O traits + desktop simulation backends

/// One bell drive line (assert/deassert).
///
/// Implement this for your output hardware (GPIO, relay driver, MOSFET
/// stage). Drive errors are handled internally — these methods cannot fail.
pub trait OutputLine: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
    /// Current commanded level (what the controller last wrote, not a readback)
    fn is_high(&self) -> bool;
}

/// The doorbell switch input — raw level, sampled every control-loop pass.
/// Debouncing is NOT this trait's job; return the electrical level as-is.
pub trait InputLine: Send {
    fn is_high(&self) -> bool;
}

// ── Simulation backends ──────────────────────────────────────────────────────
// Used on desktop builds where no real GPIO exists. Output transitions are
// traced at debug level so a ring burst is visible in the log.

/// Logging stand-in for a drive line.
pub struct SimOutput {
    name:  &'static str,
    level: bool,
}

impl SimOutput {
    pub fn new(name: &'static str) -> Self {
        Self { name, level: false }
    }
}

impl OutputLine for SimOutput {
    fn set_high(&mut self) {
        if !self.level {
            log::debug!("[gpio] {} ↑", self.name);
        }
        self.level = true;
    }
    fn set_low(&mut self) {
        if self.level {
            log::debug!("[gpio] {} ↓", self.name);
        }
        self.level = false;
    }
    fn is_high(&self) -> bool { self.level }
}

/// Switch stand-in — rests at the pull-up level and never changes.
/// A desktop run therefore rings on schedule but is never preempted.
pub struct SimInput {
    rest_high: bool,
}

impl SimInput {
    pub fn new(rest_high: bool) -> Self {
        Self { rest_high }
    }
}

impl InputLine for SimInput {
    fn is_high(&self) -> bool { self.rest_high }
}

/// Factory — the two bell drive lines plus the switch input.
///
/// `switch_active_low` describes the wiring: true means pull-up + switch to
/// ground (the rest level is high), which is how the original board is wired.
pub fn create_lines(
    switch_active_low: bool,
) -> (Box<dyn OutputLine>, Box<dyn OutputLine>, Box<dyn InputLine>) {
    let a = Box::new(SimOutput::new("ring-a"));
    let b = Box::new(SimOutput::new("ring-b"));
    let sw = Box::new(SimInput::new(switch_active_low));
    (a, b, sw)
}
