// src/audio/mod.rs  —  AudioSink trait + cpal backend
use anyhow::Result;

/// Platform-agnostic PCM output. One clip playback is bracketed by
/// `start`/`stop`; `write` queues frames and blocks when the device
/// buffer is full, which is what keeps playback a bounded blocking call.
pub trait AudioSink: Send {
    fn start(&mut self) -> Result<()>;
    /// Queue mono 16-bit frames at the configured sample rate (blocking)
    fn write(&mut self, frames: &[i16]) -> Result<()>;
    /// Drain whatever is still queued, then go silent
    fn stop(&mut self) -> Result<()>;
    fn sample_rate(&self) -> u32;
}

// ── cpal backend ─────────────────────────────────────────────────────────────
#[cfg(feature = "audio-cpal")]
mod cpal_backend;
#[cfg(feature = "audio-cpal")]
pub use cpal_backend::CpalSink;

/// Null backend (no sound — useful for testing / no-audio builds).
/// Sleeps through the frames so playback timing feels real.
pub struct NullSink {
    sample_rate: u32,
}

impl NullSink {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate: sample_rate.max(1) }
    }
}

impl AudioSink for NullSink {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }
    fn write(&mut self, frames: &[i16]) -> Result<()> {
        let micros = frames.len() as u64 * 1_000_000 / self.sample_rate as u64;
        std::thread::sleep(std::time::Duration::from_micros(micros));
        Ok(())
    }
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Factory: returns the best available backend
pub fn create_sink(sample_rate: u32, volume: f32) -> Box<dyn AudioSink> {
    #[cfg(feature = "audio-cpal")]
    {
        match CpalSink::new(sample_rate, volume) {
            Ok(s)  => return Box::new(s),
            Err(e) => log::warn!("cpal init failed: {e}  →  using NullSink"),
        }
    }
    #[cfg(not(feature = "audio-cpal"))]
    let _ = volume;
    Box::new(NullSink::new(sample_rate))
}
