// src/playback.rs  —  Stream one clip from storage to the audio sink
use crate::audio::AudioSink;
use crate::storage::Storage;
use std::io::Read;
use thiserror::Error;

/// Samples per chunk read from storage (matches the sink's buffer depth).
pub const CHUNK_SAMPLES: usize = 512;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("cannot open clip {name}: {source}")]
    FileOpen {
        name:   String,
        source: std::io::Error,
    },
    #[error("read failed mid-clip: {0}")]
    Read(std::io::Error),
    #[error("audio sink: {0}")]
    Sink(anyhow::Error),
}

/// The seam the arbiter plays clips through.
pub trait ClipPlayer {
    /// Blocking for the whole clip by design: the control loop is
    /// single-threaded and the switch is deliberately not polled while a
    /// clip plays. There is no mid-clip cancellation.
    fn play(&mut self, name: &str) -> Result<(), PlaybackError>;
}

/// Reads 16-bit little-endian PCM in fixed-size chunks and pushes the
/// frames to the sink until the clip is exhausted.
pub struct PlaybackAdapter {
    storage: Box<dyn Storage>,
    sink:    Box<dyn AudioSink>,
}

impl PlaybackAdapter {
    pub fn new(storage: Box<dyn Storage>, sink: Box<dyn AudioSink>) -> Self {
        Self { storage, sink }
    }
}

impl ClipPlayer for PlaybackAdapter {
    fn play(&mut self, name: &str) -> Result<(), PlaybackError> {
        let mut clip = self.storage.open(name)?;
        self.sink.start().map_err(PlaybackError::Sink)?;
        log::info!("[playback] {name}");

        let mut buf = [0u8; CHUNK_SAMPLES * 2];
        let mut frames = [0i16; CHUNK_SAMPLES];
        loop {
            let n = fill(clip.as_mut(), &mut buf).map_err(PlaybackError::Read)?;
            if n == 0 {
                break;
            }
            // Clips are raw 16-bit LE; an odd final byte is not a sample
            let whole = n / 2;
            for (i, frame) in frames[..whole].iter_mut().enumerate() {
                *frame = i16::from_le_bytes([buf[2 * i], buf[2 * i + 1]]);
            }
            self.sink.write(&frames[..whole]).map_err(PlaybackError::Sink)?;
        }

        self.sink.stop().map_err(PlaybackError::Sink)?;
        log::info!("[playback] {name} done");
        Ok(())
    }
}

/// Read until `buf` is full or the clip ends. Guarantees a short count
/// only at end-of-stream, so sample pairs never straddle chunk reads.
fn fill<R: Read + ?Sized>(clip: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = clip.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct MemStorage {
        clips: Vec<(String, Vec<u8>)>,
    }

    impl Storage for MemStorage {
        fn list(&self) -> Result<Vec<String>> {
            Ok(self.clips.iter().map(|(n, _)| n.clone()).collect())
        }
        fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, PlaybackError> {
            self.clips
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, bytes)| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read + Send>)
                .ok_or_else(|| PlaybackError::FileOpen {
                    name:   name.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no clip"),
                })
        }
    }

    #[derive(Clone, Default)]
    struct CollectingSink {
        frames:   Arc<Mutex<Vec<i16>>>,
        sessions: Arc<Mutex<u32>>,
    }

    impl AudioSink for CollectingSink {
        fn start(&mut self) -> Result<()> {
            *self.sessions.lock().unwrap() += 1;
            Ok(())
        }
        fn write(&mut self, frames: &[i16]) -> Result<()> {
            self.frames.lock().unwrap().extend_from_slice(frames);
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            Ok(())
        }
        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    fn adapter(clips: Vec<(String, Vec<u8>)>) -> (PlaybackAdapter, CollectingSink) {
        let sink = CollectingSink::default();
        let adapter = PlaybackAdapter::new(
            Box::new(MemStorage { clips }),
            Box::new(sink.clone()),
        );
        (adapter, sink)
    }

    #[test]
    fn streams_every_frame_in_order() {
        // 3 chunks worth of samples plus a partial chunk
        let samples: Vec<i16> = (0..(CHUNK_SAMPLES as i16 * 3 + 7)).collect();
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let (mut adapter, sink) = adapter(vec![("ding.pcm".into(), bytes)]);

        adapter.play("ding.pcm").unwrap();
        assert_eq!(*sink.frames.lock().unwrap(), samples);
        assert_eq!(*sink.sessions.lock().unwrap(), 1);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let bytes = vec![0x34, 0x12, 0xff];
        let (mut adapter, sink) = adapter(vec![("ding.pcm".into(), bytes)]);

        adapter.play("ding.pcm").unwrap();
        assert_eq!(*sink.frames.lock().unwrap(), vec![0x1234]);
    }

    #[test]
    fn empty_clip_still_brackets_a_session() {
        let (mut adapter, sink) = adapter(vec![("ding.pcm".into(), Vec::new())]);
        adapter.play("ding.pcm").unwrap();
        assert!(sink.frames.lock().unwrap().is_empty());
        assert_eq!(*sink.sessions.lock().unwrap(), 1);
    }

    #[test]
    fn missing_clip_is_a_file_open_error_and_never_touches_the_sink() {
        let (mut adapter, sink) = adapter(vec![]);
        let err = adapter.play("ghost.pcm").unwrap_err();
        assert!(matches!(err, PlaybackError::FileOpen { .. }));
        assert_eq!(*sink.sessions.lock().unwrap(), 0);
    }
}
