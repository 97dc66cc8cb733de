// src/storage.rs  —  Clip storage (records directory on removable media)
use crate::playback::PlaybackError;
use anyhow::Result;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// Where the recorded chime clips live. The arbiter never touches the
/// filesystem directly; everything goes through this seam.
pub trait Storage: Send {
    /// Enumerate clip names, ordered. Called once at startup; an empty
    /// set is a valid answer (the bell still rings, playback is skipped).
    fn list(&self) -> Result<Vec<String>>;
    /// Open one clip for sequential reading.
    fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, PlaybackError>;
}

/// Flat directory of raw PCM clips. Subdirectories are ignored; the
/// listing is sorted so selection indexes are stable between runs.
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Storage for DirStorage {
    fn list(&self) -> Result<Vec<String>> {
        let rd = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) => {
                // Missing card or directory: ring-only operation
                log::warn!("cannot read {}: {e}", self.root.display());
                return Ok(Vec::new());
            }
        };
        let mut out = Vec::new();
        for entry in rd {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                out.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        out.sort();
        Ok(out)
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, PlaybackError> {
        match fs::File::open(self.root.join(name)) {
            Ok(f) => Ok(Box::new(f)),
            Err(e) => Err(PlaybackError::FileOpen { name: name.to_string(), source: e }),
        }
    }
}
