// src/bell/mod.rs  —  Ring/interrupt/playback state machine
//
// Nesting, innermost out:
//   Debouncer       switch level filtering
//   PulseSequencer  four-phase coil drive (one ring pulse)
//   CycleController bursts + inter-cycle pauses, bounded repeat
//   ModeArbiter     Idle / Ringing / Playing, trigger + preemption
pub mod arbiter;
pub mod cycle;
pub mod debounce;
pub mod pulse;

pub use arbiter::{Mode, ModeArbiter};
pub use cycle::{CycleController, RingEvent};
pub use debounce::Debouncer;
pub use pulse::{PulsePhase, PulseSequencer, PulseTiming};
