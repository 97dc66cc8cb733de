// src/audio/cpal_backend.rs  —  cpal PCM queue playback
use super::AudioSink;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Queue depth before `write` applies backpressure.
/// 8 × 512 samples, the original board's DMA depth.
const QUEUE_CAPACITY: usize = 8 * 512;

struct SharedState {
    queue:  VecDeque<i16>,
    volume: f32,
}

/// Pushes queued frames out through the default output device. The stream
/// callback drains the queue and plays silence when it runs dry, so a
/// stream with nothing queued is inaudible rather than glitchy.
pub struct CpalSink {
    state: Arc<Mutex<SharedState>>,
    _stream: Stream,
    sample_rate: u32,
}

// Stream is !Send on some platforms; wrap it
unsafe impl Send for CpalSink {}

impl CpalSink {
    pub fn new(sample_rate: u32, volume: f32) -> Result<Self> {
        let host   = cpal::default_host();
        let device = host.default_output_device()
            .ok_or_else(|| anyhow!("No output device"))?;
        let default = device.default_output_config()?;

        // Ask for the clip rate directly; no resampling here (clips are
        // raw PCM and decoding is out of scope)
        let config = cpal::StreamConfig {
            channels:    default.channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let state = Arc::new(Mutex::new(SharedState {
            queue: VecDeque::new(),
            volume,
        }));

        let st = Arc::clone(&state);
        let stream = match default.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, st)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, st)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, st)?,
            _                 => return Err(anyhow!("Unsupported sample format")),
        };
        stream.play()?;
        Ok(Self { state, _stream: stream, sample_rate })
    }

    fn queued(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }
}

fn build_stream<S>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    state: Arc<Mutex<SharedState>>,
) -> Result<Stream>
where S: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>
{
    let ch = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [S], _: &cpal::OutputCallbackInfo| {
            let mut s = state.lock().unwrap();
            for frame in data.chunks_mut(ch) {
                let sample = match s.queue.pop_front() {
                    Some(v) => v as f32 / i16::MAX as f32 * s.volume,
                    None    => 0.0,
                };
                let out = S::from_sample(sample);
                for smp in frame.iter_mut() { *smp = out; }
            }
        },
        |e| log::error!("Audio error: {e}"),
        None,
    )?;
    Ok(stream)
}

impl AudioSink for CpalSink {
    fn start(&mut self) -> Result<()> {
        // Anything a previous session left behind must not leak into this one
        self.state.lock().unwrap().queue.clear();
        Ok(())
    }

    fn write(&mut self, frames: &[i16]) -> Result<()> {
        {
            let mut s = self.state.lock().unwrap();
            s.queue.extend(frames.iter().copied());
        }
        // Backpressure: let the callback drain to the bounded depth
        while self.queued() > QUEUE_CAPACITY {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        while self.queued() > 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
