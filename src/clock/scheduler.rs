//! The timing loop that emits Timing Clock pulses while the transport runs.
//!
//! Pulse `k` of a schedule is due at `reference + k * interval`. Targets are
//! always recomputed from the fixed reference so rounding never accumulates.
//! The reference moves in two cases only:
//! - the interval changed (live BPM edit): the schedule is rebased onto the
//!   ideal time of the last emitted pulse, so the next pulse lands one new
//!   interval later, or immediately if that moment has already passed;
//! - a pulse went out more than `resync_multiple` intervals late: it becomes
//!   the origin of a fresh schedule instead of firing a catch-up burst.

use super::observer::ClockObserver;
use crate::midi::{MidiError, MidiSink, TIMING_CLOCK};
use crate::state::ClockState;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_RESYNC_MULTIPLE: u32 = 2;

/// Upper bound on one sleep of the timing loop. Short naps approximate a spin
/// wait closely enough for MIDI clock without pegging a core.
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_millis(1);

/// Sink shared by the controller and the timing thread.
///
/// The lock doubles as the emission gate: a pulse is only sent while holding
/// it and after re-checking the running flag.
pub type SinkSlot = Arc<Mutex<Option<Arc<dyn MidiSink>>>>;

pub(crate) fn lock_sink(slot: &SinkSlot) -> MutexGuard<'_, Option<Arc<dyn MidiSink>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tunables of the timing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Lateness, in pulse intervals, beyond which the schedule is restarted
    pub resync_multiple: u32,
    pub max_sleep: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            resync_multiple: DEFAULT_RESYNC_MULTIPLE,
            max_sleep: DEFAULT_MAX_SLEEP,
        }
    }
}

impl SchedulerSettings {
    /// Lateness that triggers a resync at the given interval
    pub fn resync_threshold(&self, interval: Duration) -> Duration {
        interval * self.resync_multiple.max(1)
    }
}

/// Everything the timing thread needs, moved into it at spawn
pub(crate) struct SchedulerContext {
    pub state: Arc<ClockState>,
    pub sink: SinkSlot,
    pub observer: Arc<dyn ClockObserver>,
    pub settings: SchedulerSettings,
    /// Never receives a value; disconnection wakes a sleeping loop on stop
    pub wake_rx: Receiver<()>,
}

enum Emission {
    Sent,
    Failed(MidiError),
    Stopped,
}

fn emit_pulse(state: &ClockState, sink: &SinkSlot) -> Emission {
    let slot = lock_sink(sink);
    if !state.is_running() {
        return Emission::Stopped;
    }
    match slot.as_ref().map(|s| s.send_byte(TIMING_CLOCK)) {
        Some(Err(e)) => Emission::Failed(e),
        _ => Emission::Sent,
    }
}

/// Runs until the running flag clears. Never emits Stop; the controller does.
pub(crate) fn run_pulse_scheduler(ctx: SchedulerContext) {
    let SchedulerContext {
        state,
        sink,
        observer,
        settings,
        wake_rx,
    } = ctx;

    let mut interval = state.tempo().interval();
    let mut reference = Instant::now();
    let mut index: u32 = 0;

    while state.is_running() {
        let current = state.tempo().interval();
        let now = Instant::now();
        if current != interval {
            reference += interval * index.saturating_sub(1);
            index = u32::from(index > 0);
            interval = current;
            // Speeding up can put the next target in the past; start from now
            if index > 0 && reference + interval <= now {
                reference = now;
                index = 0;
            }
        }

        let target = reference + interval * index;

        if now >= target {
            match emit_pulse(&state, &sink) {
                Emission::Stopped => break,
                Emission::Failed(e) => observer.on_send_error(&e),
                Emission::Sent => {}
            }
            let sent_at = Instant::now();
            index = index.saturating_add(1);
            if let Some(beat) = state.record_pulse() {
                observer.on_beat(beat, state.pulse_count());
            }

            // Measured after the send so a stalled sink counts as lateness
            let lateness = sent_at - target;
            if lateness > settings.resync_threshold(interval) {
                reference = sent_at;
                index = 1;
                observer.on_resync(lateness, interval);
            }
            continue;
        }

        let nap = ((target - now) / 2).min(settings.max_sleep);
        if let Err(RecvTimeoutError::Disconnected) = wake_rx.recv_timeout(nap) {
            break;
        }
    }
}
