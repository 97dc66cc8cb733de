// src/config.rs  —  Runtime configuration (CLI + TOML)
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The example config is embedded directly in the binary at compile time.
/// Users can write it out with:  door-chime --write-config
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config.toml.example");

// ── CLI ───────────────────────────────────────────────────────────────────────
#[derive(Parser, Debug)]
#[command(
    name        = "door-chime",
    about       = "Doorbell ring/playback controller  |  DD6DS",
    version,
)]
pub struct Cli {
    /// Config file path (default: ~/.config/door-chime/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the recorded chime clips (raw 16-bit LE PCM)
    #[arg(long)]
    pub records_dir: Option<PathBuf>,

    /// Ring interval override in milliseconds
    #[arg(long)]
    pub interval_ms: Option<i64>,

    /// List the clips found in the records directory and exit
    #[arg(long, action)]
    pub list_files: bool,

    /// Write the built-in default config.toml to the config path and exit.
    /// Use --config <PATH> to write to a custom location.
    #[arg(long, action)]
    pub write_config: bool,

    /// Print the built-in default config.toml to stdout and exit
    #[arg(long, action)]
    pub print_config: bool,
}

// ── TOML file structure ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub general: Option<GeneralCfg>,
    pub ring:    Option<RingCfg>,
    pub audio:   Option<AudioCfg>,
    pub io:      Option<IoCfg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralCfg {
    pub records_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingCfg {
    /// Milliseconds between unattended rings
    pub interval_ms:    Option<i64>,
    /// Ring bursts per trigger
    pub cycles:         Option<i64>,
    /// Silence between bursts (ms)
    pub cycle_pause_ms: Option<i64>,
    /// Hard cap on one burst (ms)
    pub burst_ms:       Option<i64>,
    pub coil_a_ms:      Option<i64>,
    pub coil_b_ms:      Option<i64>,
    pub gap_ms:         Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioCfg {
    pub sample_rate: Option<i64>,
    pub volume:      Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoCfg {
    /// true = pull-up wiring, switch shorts to ground when pressed
    pub switch_active_low: Option<bool>,
    pub debounce_ms:       Option<i64>,
}

// ── Resolved / merged config ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub records_dir:    PathBuf,
    pub interval_ms:    u64,
    pub cycles:         u32,
    pub cycle_pause_ms: u64,
    pub burst_ms:       u64,
    /// Strike coil on-time (ms)
    pub coil_a_ms:      u64,
    /// Return coil on-time (ms)
    pub coil_b_ms:      u64,
    /// Inter-coil gap (ms)
    pub gap_ms:         u64,
    pub sample_rate:    u32,
    pub volume:         f32,
    pub switch_active_low: bool,
    pub debounce_ms:    u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            records_dir:    "records".into(),
            interval_ms:    60_000,
            cycles:         3,
            cycle_pause_ms: 4_000,
            burst_ms:       1_000,
            coil_a_ms:      5,
            coil_b_ms:      4,
            gap_ms:         3,
            sample_rate:    16_000,
            volume:         1.0,
            switch_active_low: true,
            debounce_ms:    10,
        }
    }
}

// ── Config loader ─────────────────────────────────────────────────────────────
impl AppConfig {
    /// Write the embedded default config to disk.
    /// Returns the path it was written to.
    pub fn write_default_config(cli: &Cli) -> Result<PathBuf> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating config directory {:?}", parent))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Writing config to {:?}", path))?;
        Ok(path)
    }

    /// Config problems are never fatal: a missing or broken file means the
    /// defaults run, and the bell keeps working.
    pub fn load(cli: &Cli) -> Self {
        let mut cfg = Self::default();

        // 1. Load TOML file
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        match std::fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(fc) => cfg.apply_file(&fc),
                Err(e) => log::warn!("config {} unreadable ({e}) — using defaults", path.display()),
            },
            Err(_) => {
                log::info!(
                    "no config at {} — using defaults (door-chime --write-config creates one)",
                    path.display()
                );
            }
        }

        // 2. Apply CLI overrides
        cfg.apply_cli(cli);
        cfg
    }

    fn apply_file(&mut self, fc: &FileConfig) {
        if let Some(g) = &fc.general {
            if let Some(v) = &g.records_dir { self.records_dir = v.clone(); }
        }
        if let Some(r) = &fc.ring {
            apply_positive(&mut self.interval_ms,    r.interval_ms,    "ring.interval_ms");
            apply_positive(&mut self.cycles,         r.cycles,         "ring.cycles");
            apply_positive(&mut self.cycle_pause_ms, r.cycle_pause_ms, "ring.cycle_pause_ms");
            apply_positive(&mut self.burst_ms,       r.burst_ms,       "ring.burst_ms");
            apply_positive(&mut self.coil_a_ms,      r.coil_a_ms,      "ring.coil_a_ms");
            apply_positive(&mut self.coil_b_ms,      r.coil_b_ms,      "ring.coil_b_ms");
            apply_positive(&mut self.gap_ms,         r.gap_ms,         "ring.gap_ms");
        }
        if let Some(a) = &fc.audio {
            apply_positive(&mut self.sample_rate, a.sample_rate, "audio.sample_rate");
            if let Some(v) = a.volume { self.volume = v.clamp(0.0, 1.0); }
        }
        if let Some(io) = &fc.io {
            if let Some(v) = io.switch_active_low { self.switch_active_low = v; }
            apply_positive(&mut self.debounce_ms, io.debounce_ms, "io.debounce_ms");
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.records_dir { self.records_dir = v.clone(); }
        apply_positive(&mut self.interval_ms, cli.interval_ms, "--interval-ms");
    }
}

/// Non-positive values fall back to the default rather than aborting;
/// every duration and rate in here must stay > 0.
fn apply_positive<T: TryFrom<i64>>(slot: &mut T, value: Option<i64>, name: &str) {
    if let Some(v) = value {
        match T::try_from(v) {
            Ok(parsed) if v > 0 => *slot = parsed,
            _ => log::warn!("{name} = {v} is not a positive value — keeping default"),
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs_next().join("door-chime").join("config.toml")
}

fn dirs_next() -> PathBuf {
    if let Ok(v) = std::env::var("XDG_CONFIG_HOME") { return PathBuf::from(v); }
    if let Ok(v) = std::env::var("APPDATA")          { return PathBuf::from(v); }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default();
    PathBuf::from(home).join(".config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_every_default() {
        let mut cfg = AppConfig::default();
        cfg.apply_file(&FileConfig::default());
        assert_eq!(cfg.interval_ms, 60_000);
        assert_eq!(cfg.sample_rate, 16_000);
        assert_eq!(cfg.cycles, 3);
    }

    #[test]
    fn file_values_override_defaults() {
        let fc: FileConfig = toml::from_str(
            r#"
            [ring]
            interval_ms = 30000
            cycles = 5

            [audio]
            sample_rate = 44100
            "#,
        )
        .unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert_eq!(cfg.interval_ms, 30_000);
        assert_eq!(cfg.cycles, 5);
        assert_eq!(cfg.sample_rate, 44_100);
    }

    #[test]
    fn non_positive_scalars_fall_back_to_defaults() {
        let fc: FileConfig = toml::from_str(
            r#"
            [ring]
            interval_ms = 0

            [audio]
            sample_rate = -16000
            "#,
        )
        .unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert_eq!(cfg.interval_ms, 60_000);
        assert_eq!(cfg.sample_rate, 16_000);
    }

    #[test]
    fn example_config_parses() {
        let fc: Result<FileConfig, _> = toml::from_str(DEFAULT_CONFIG_TOML);
        assert!(fc.is_ok());
    }

    #[test]
    fn volume_is_clamped() {
        let fc: FileConfig = toml::from_str("[audio]\nvolume = 3.5\n").unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert_eq!(cfg.volume, 1.0);
    }
}
