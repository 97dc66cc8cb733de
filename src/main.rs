// src/main.rs  —  door-chime  entry point
mod audio;
mod bell;
mod config;
mod gpio;
mod playback;
mod storage;

use anyhow::Result;
use audio::AudioSink;
use bell::{CycleController, ModeArbiter, PulseSequencer, PulseTiming};
use clap::Parser;
use config::{AppConfig, Cli};
use playback::PlaybackAdapter;
use storage::{DirStorage, Storage};
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // ── --print-config  ───────────────────────────────────────────────────────
    if cli.print_config {
        print!("{}", config::DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    // ── --write-config  ───────────────────────────────────────────────────────
    if cli.write_config {
        let path = AppConfig::write_default_config(&cli)?;
        println!("Config written to: {}", path.display());
        println!("Edit it to set the records directory, ring interval, etc.");
        return Ok(());
    }

    // ── Load config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::load(&cli);

    // ── Storage: enumerate the clip set once ─────────────────────────────────
    let store = DirStorage::new(&cfg.records_dir);
    let files = store.list().unwrap_or_else(|e| {
        log::warn!("listing {} failed: {e}", cfg.records_dir.display());
        Vec::new()
    });

    // ── --list-files  ─────────────────────────────────────────────────────────
    if cli.list_files {
        if files.is_empty() {
            println!("No clips found in {}", cfg.records_dir.display());
        } else {
            println!("Clips in {}:", cfg.records_dir.display());
            for f in &files { println!("  {f}"); }
        }
        return Ok(());
    }

    log::info!("{} clip(s) in {}", files.len(), cfg.records_dir.display());
    if files.is_empty() {
        log::warn!("no clips — a switch press will only silence the ring");
    }

    // ── Peripherals ───────────────────────────────────────────────────────────
    let (line_a, line_b, switch) = gpio::create_lines(cfg.switch_active_low);
    let sink = audio::create_sink(cfg.sample_rate, cfg.volume);
    log::info!("audio sink ready at {} Hz", sink.sample_rate());
    let mut player = PlaybackAdapter::new(Box::new(store), sink);

    // ── Ring state machine ────────────────────────────────────────────────────
    let timing = PulseTiming {
        coil_a: Duration::from_millis(cfg.coil_a_ms),
        coil_b: Duration::from_millis(cfg.coil_b_ms),
        gap:    Duration::from_millis(cfg.gap_ms),
    };
    let seq = PulseSequencer::new(line_a, line_b, timing);
    let cycle = CycleController::new(
        seq,
        cfg.cycles,
        Duration::from_millis(cfg.cycle_pause_ms),
        Duration::from_millis(cfg.burst_ms),
    );
    let mut arbiter = ModeArbiter::new(cycle, files, &cfg, Instant::now());

    log::info!(
        "ready: ring every {} ms, {} bursts per ring",
        cfg.interval_ms, cfg.cycles
    );

    // ── Control loop ──────────────────────────────────────────────────────────
    // Single-threaded and cooperative. Each pass samples the switch and
    // advances the arbiter; clip playback blocks the loop for its duration.
    let tick = Duration::from_millis(2);
    loop {
        arbiter.tick(Instant::now(), switch.is_high(), &mut player);
        thread::sleep(tick);
    }
}
