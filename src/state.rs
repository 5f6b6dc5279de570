use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 120.0;

/// Pulses per quarter note, fixed by the MIDI clock standard
pub const PPQN: u64 = 24;

/// Clock pulses per 16th note, the unit of Song Position Pointer
pub const PULSES_PER_SIXTEENTH: u64 = PPQN / 4;

/// BPM and the pulse interval derived from it, plus the published beat counter.
///
/// These live behind one lock so a reader never sees a BPM paired with the
/// interval of a different BPM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
    micros_per_pulse: u64,
    beat_count: u64,
}

impl Tempo {
    /// Builds a tempo from `bpm`, clamped to [`MIN_BPM`, `MAX_BPM`]
    pub fn from_bpm(bpm: f64) -> Self {
        let bpm = clamp_bpm(bpm).unwrap_or(DEFAULT_BPM);
        Self {
            bpm,
            micros_per_pulse: micros_per_pulse(bpm),
            beat_count: 0,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn micros_per_pulse(&self) -> u64 {
        self.micros_per_pulse
    }

    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.micros_per_pulse)
    }

    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }
}

/// Clamps a BPM into the valid range. NaN has no meaningful clamp and yields `None`.
pub fn clamp_bpm(bpm: f64) -> Option<f64> {
    if bpm.is_nan() {
        None
    } else {
        Some(bpm.clamp(MIN_BPM, MAX_BPM))
    }
}

/// Microseconds between clock pulses, truncated to whole microseconds
pub fn micros_per_pulse(bpm: f64) -> u64 {
    (60_000_000.0 / (bpm * PPQN as f64)) as u64
}

/// Point-in-time copy of the clock state for display and inspection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSnapshot {
    pub bpm: f64,
    pub micros_per_pulse: u64,
    pub pulse_count: u64,
    pub beat_count: u64,
    pub running: bool,
}

impl ClockSnapshot {
    /// Elapsed position of the current run in 16th notes
    pub fn song_position(&self) -> u64 {
        self.pulse_count / PULSES_PER_SIXTEENTH
    }
}

/// State shared between the transport controller and the pulse scheduler
pub struct ClockState {
    tempo: Mutex<Tempo>,
    running: AtomicBool,
    pulse_count: AtomicU64,
}

impl Default for ClockState {
    fn default() -> Self {
        Self::with_bpm(DEFAULT_BPM)
    }
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            tempo: Mutex::new(Tempo::from_bpm(bpm)),
            running: AtomicBool::new(false),
            pulse_count: AtomicU64::new(0),
        }
    }

    fn lock_tempo(&self) -> MutexGuard<'_, Tempo> {
        self.tempo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the BPM, clamping it into range, and returns the value stored.
    ///
    /// NaN leaves the current BPM in place.
    pub fn set_bpm(&self, bpm: f64) -> f64 {
        let Some(clamped) = clamp_bpm(bpm) else {
            warn!("Ignoring non-numeric BPM value");
            return self.bpm();
        };

        let mut tempo = self.lock_tempo();
        tempo.bpm = clamped;
        tempo.micros_per_pulse = micros_per_pulse(clamped);
        debug!(
            "Clock settings: BPM {} micros per pulse {}",
            tempo.bpm, tempo.micros_per_pulse
        );
        clamped
    }

    /// Moves the BPM by `delta` in one step, clamping the result
    pub fn adjust_bpm(&self, delta: f64) -> f64 {
        let mut tempo = self.lock_tempo();
        if let Some(clamped) = clamp_bpm(tempo.bpm + delta) {
            tempo.bpm = clamped;
            tempo.micros_per_pulse = micros_per_pulse(clamped);
        }
        tempo.bpm
    }

    pub fn bpm(&self) -> f64 {
        self.lock_tempo().bpm
    }

    /// Current tempo, read atomically with respect to `set_bpm`
    pub fn tempo(&self) -> Tempo {
        *self.lock_tempo()
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Zeroes the pulse and beat counters for a new run
    pub fn reset_counters(&self) {
        let mut tempo = self.lock_tempo();
        self.pulse_count.store(0, Ordering::SeqCst);
        tempo.beat_count = 0;
    }

    /// Records one emitted pulse and returns the new beat count when the
    /// pulse completes a quarter note.
    pub fn record_pulse(&self) -> Option<u64> {
        let pulses = self.pulse_count.fetch_add(1, Ordering::SeqCst) + 1;
        if pulses % PPQN == 0 {
            let mut tempo = self.lock_tempo();
            tempo.beat_count += 1;
            Some(tempo.beat_count)
        } else {
            None
        }
    }

    pub fn pulse_count(&self) -> u64 {
        self.pulse_count.load(Ordering::SeqCst)
    }

    pub fn beat_count(&self) -> u64 {
        self.lock_tempo().beat_count
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let tempo = self.tempo();
        ClockSnapshot {
            bpm: tempo.bpm,
            micros_per_pulse: tempo.micros_per_pulse,
            pulse_count: self.pulse_count(),
            beat_count: tempo.beat_count,
            running: self.is_running(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_at_default_bpm() {
        assert_eq!(micros_per_pulse(120.0), 20_833);
        assert_eq!(Tempo::from_bpm(120.0).micros_per_pulse(), 20_833);
    }

    #[test]
    fn test_interval_at_bounds() {
        assert_eq!(micros_per_pulse(MIN_BPM), 125_000);
        assert_eq!(micros_per_pulse(MAX_BPM), 8_333);
    }

    #[test]
    fn test_clamp_bpm() {
        assert_eq!(clamp_bpm(5.0), Some(MIN_BPM));
        assert_eq!(clamp_bpm(500.0), Some(MAX_BPM));
        assert_eq!(clamp_bpm(f64::INFINITY), Some(MAX_BPM));
        assert_eq!(clamp_bpm(f64::NEG_INFINITY), Some(MIN_BPM));
        assert_eq!(clamp_bpm(f64::NAN), None);
        assert_eq!(clamp_bpm(133.5), Some(133.5));
    }

    #[test]
    fn test_tempo_from_nan_uses_default() {
        assert_eq!(Tempo::from_bpm(f64::NAN).bpm(), DEFAULT_BPM);
    }

    #[test]
    fn test_song_position() {
        let snapshot = ClockSnapshot {
            bpm: 120.0,
            micros_per_pulse: 20_833,
            pulse_count: 25,
            beat_count: 1,
            running: true,
        };
        assert_eq!(snapshot.song_position(), 4);
    }

    #[test]
    fn test_adjust_bpm_clamps() {
        let state = ClockState::new();
        assert_eq!(state.adjust_bpm(1.0), 121.0);
        assert_eq!(state.adjust_bpm(-500.0), MIN_BPM);
        assert_eq!(state.tempo().micros_per_pulse(), 125_000);
        assert_eq!(state.adjust_bpm(f64::NAN), MIN_BPM);
    }

    #[test]
    fn test_record_pulse_reports_beats() {
        let state = ClockState::new();
        for _ in 0..23 {
            assert_eq!(state.record_pulse(), None);
        }
        assert_eq!(state.record_pulse(), Some(1));
        assert_eq!(state.pulse_count(), 24);
    }
}
