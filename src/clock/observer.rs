use crate::midi::MidiError;
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Transport changes reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Started,
    Stopped,
}

/// Diagnostic hook for the clock engine.
///
/// Callbacks run on the thread that produced the event, after every lock has
/// been released. The scheduler calls `on_beat` and `on_resync` from the timing
/// thread, so implementations must return quickly.
pub trait ClockObserver: Send + Sync {
    fn on_beat(&self, _beat: u64, _pulse_count: u64) {}

    /// The scheduler fell `lateness` behind a pulse and restarted its schedule
    fn on_resync(&self, _lateness: Duration, _interval: Duration) {}

    fn on_transport(&self, _event: TransportEvent) {}

    /// The sink rejected a pulse; timing state advanced regardless
    fn on_send_error(&self, _error: &MidiError) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ClockObserver for NullObserver {}

/// Observer that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ClockObserver for LogObserver {
    fn on_beat(&self, beat: u64, pulse_count: u64) {
        trace!("Clock beat {} (pulse {})", beat, pulse_count);
    }

    fn on_resync(&self, lateness: Duration, interval: Duration) {
        warn!(
            "Clock fell {:?} behind schedule (interval {:?}), resynchronizing",
            lateness, interval
        );
    }

    fn on_transport(&self, event: TransportEvent) {
        match event {
            TransportEvent::Started => info!("MIDI Clock started"),
            TransportEvent::Stopped => info!("MIDI Clock stopped"),
        }
    }

    fn on_send_error(&self, error: &MidiError) {
        debug!("Dropped clock pulse: {}", error);
    }
}
