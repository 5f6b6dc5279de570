mod input;

use crate::clock::ClockEngine;
use crate::state::ClockSnapshot;
use dialoguer::console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub use input::{map_key, ClockCommand, BPM_STEP};

const STATUS_REFRESH: Duration = Duration::from_millis(50);

pub const CONTROLS: &str = "Start/Stop: Space | Tempo: +/- | Reset: Backspace | Quit: Q";

/// Applies a keyboard command to the engine. Returns false when the user quit.
pub fn apply_command(engine: &ClockEngine, command: ClockCommand) -> bool {
    match command {
        ClockCommand::Toggle => engine.toggle_clock(),
        ClockCommand::NudgeBpm(delta) => {
            let bpm = engine.nudge_bpm(delta);
            log::info!("Tempo changed to {:.2} BPM", bpm);
        }
        ClockCommand::ResetBpm => {
            engine.reset_bpm();
            log::info!("Tempo reset to {:.2} BPM", engine.bpm());
        }
        ClockCommand::Quit => return false,
    }
    true
}

pub fn format_status(snapshot: &ClockSnapshot, running: bool) -> String {
    format!(
        "MIDI OUT CLOCK: {} | BPM: {:.2} | Beat: {} | Position: {}",
        if running { "On" } else { "Off" },
        snapshot.bpm,
        snapshot.beat_count,
        snapshot.song_position()
    )
}

fn create_status_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Clock");
    pb
}

/// Redraws the clock status until `quit` is set
pub fn run_status_display(engine: Arc<ClockEngine>, quit: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let pb = create_status_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        while !quit.load(Ordering::SeqCst) {
            pb.set_message(format_status(&engine.snapshot(), engine.is_clock_running()));
            thread::sleep(STATUS_REFRESH);
        }
        pb.finish_and_clear();
    })
}

/// Reads keys from the terminal and drives the clock until the user quits
pub fn run_keyboard_loop(engine: Arc<ClockEngine>) -> io::Result<()> {
    log::info!("Starting keyboard loop");
    let term = Term::stdout();
    term.write_line(CONTROLS)?;

    let quit = Arc::new(AtomicBool::new(false));
    let display = run_status_display(Arc::clone(&engine), Arc::clone(&quit));

    let result = loop {
        let key = match term.read_key() {
            Ok(key) => key,
            Err(e) => break Err(e),
        };
        log::debug!("Key event received: {:?}", key);
        if let Some(command) = map_key(&key) {
            if !apply_command(&engine, command) {
                log::info!("Quit key pressed. Exiting keyboard loop.");
                break Ok(());
            }
        }
    };

    quit.store(true, Ordering::SeqCst);
    let _ = display.join();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status() {
        let snapshot = ClockSnapshot {
            bpm: 120.0,
            micros_per_pulse: 20_833,
            pulse_count: 48,
            beat_count: 2,
            running: true,
        };
        assert_eq!(
            format_status(&snapshot, true),
            "MIDI OUT CLOCK: On | BPM: 120.00 | Beat: 2 | Position: 8"
        );
    }

    #[test]
    fn test_apply_command() {
        let engine = ClockEngine::new();
        assert!(apply_command(&engine, ClockCommand::NudgeBpm(BPM_STEP)));
        assert_eq!(engine.bpm(), 121.0);
        assert!(apply_command(&engine, ClockCommand::ResetBpm));
        assert_eq!(engine.bpm(), 120.0);
        assert!(!apply_command(&engine, ClockCommand::Quit));
    }

    #[test]
    fn test_toggle_command_without_sink() {
        let engine = ClockEngine::new();
        apply_command(&engine, ClockCommand::Toggle);
        assert!(engine.is_clock_running());
        apply_command(&engine, ClockCommand::Toggle);
        assert!(!engine.is_clock_running());
    }
}
