use super::observer::{ClockObserver, LogObserver, TransportEvent};
use super::scheduler::{
    lock_sink, run_pulse_scheduler, SchedulerContext, SchedulerSettings, SinkSlot,
};
use crate::config::ClockConfig;
use crate::midi::{MidiError, MidiSink, RealtimeMessage};
use crate::state::{ClockSnapshot, ClockState, DEFAULT_BPM};
use crossbeam::channel::{bounded, Sender};
use log::{debug, error, info};
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

const SCHEDULER_THREAD_NAME: &str = "midi-clock";

struct Worker {
    handle: JoinHandle<()>,
    /// Dropped on stop to wake the scheduler out of its sleep
    wake_tx: Sender<()>,
}

/// Transport controller for the MIDI clock.
///
/// Owns the BPM and run state, and spawns the pulse scheduler thread for the
/// duration of each run. All methods take `&self` so the engine can be shared
/// between a UI thread and anything else driving the transport.
pub struct ClockEngine {
    state: Arc<ClockState>,
    sink: SinkSlot,
    observer: Arc<dyn ClockObserver>,
    settings: SchedulerSettings,
    worker: Mutex<Option<Worker>>,
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockEngine {
    /// Creates a stopped engine at 120 BPM with no sink attached
    pub fn new() -> Self {
        Self {
            state: Arc::new(ClockState::with_bpm(DEFAULT_BPM)),
            sink: Arc::new(Mutex::new(None)),
            observer: Arc::new(LogObserver),
            settings: SchedulerSettings::default(),
            worker: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        let engine = Self::new().with_settings(config.scheduler_settings());
        engine.set_bpm(config.bpm);
        engine
    }

    pub fn with_settings(mut self, settings: SchedulerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ClockObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Attaches the sink clock bytes are written to. May be called while running;
    /// pulses resume on the new sink with the next interval.
    pub fn setup(&self, sink: Arc<dyn MidiSink>) {
        *lock_sink(&self.sink) = Some(sink);
        debug!("MIDI sink attached");
    }

    /// Detaches the current sink. Timing carries on without output.
    pub fn clear_sink(&self) -> Option<Arc<dyn MidiSink>> {
        lock_sink(&self.sink).take()
    }

    /// Sets the tempo, silently clamped to 20..=300 BPM
    pub fn set_bpm(&self, bpm: f64) -> f64 {
        self.state.set_bpm(bpm)
    }

    pub fn nudge_bpm(&self, delta: f64) -> f64 {
        self.state.adjust_bpm(delta)
    }

    pub fn reset_bpm(&self) -> f64 {
        self.state.set_bpm(DEFAULT_BPM)
    }

    pub fn bpm(&self) -> f64 {
        self.state.bpm()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        self.state.snapshot()
    }

    pub fn state(&self) -> &Arc<ClockState> {
        &self.state
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends Song Position 0 and Start, then launches the scheduler.
    /// Does nothing if the clock is already running.
    pub fn start(&self) {
        let mut worker = self.lock_worker();
        let started = self.start_locked(&mut worker);
        drop(worker);
        self.finish_transport(started, TransportEvent::Started);
    }

    /// Sends Stop and waits for the scheduler thread to exit. No pulse is
    /// emitted after this returns. Does nothing if the clock is stopped.
    pub fn stop(&self) {
        let mut worker = self.lock_worker();
        let stopped = self.stop_locked(&mut worker);
        drop(worker);
        self.finish_transport(stopped, TransportEvent::Stopped);
    }

    pub fn toggle_clock(&self) {
        let mut worker = self.lock_worker();
        if worker.is_some() {
            let stopped = self.stop_locked(&mut worker);
            drop(worker);
            self.finish_transport(stopped, TransportEvent::Stopped);
        } else {
            let started = self.start_locked(&mut worker);
            drop(worker);
            self.finish_transport(started, TransportEvent::Started);
        }
    }

    /// True while a run is active and its scheduler thread is alive
    pub fn is_clock_running(&self) -> bool {
        let worker = self.lock_worker();
        self.state.is_running()
            && worker
                .as_ref()
                .is_some_and(|w| !w.handle.is_finished())
    }

    /// Returns `None` when already running, otherwise the send errors of the
    /// transport messages (possibly none).
    fn start_locked(&self, worker: &mut Option<Worker>) -> Option<Vec<MidiError>> {
        if worker.is_some() {
            return None;
        }

        self.state.reset_counters();
        let errors = {
            let slot = lock_sink(&self.sink);
            let errors: Vec<MidiError> = match slot.as_ref() {
                Some(sink) => [RealtimeMessage::SongPosition(0), RealtimeMessage::Start]
                    .iter()
                    .filter_map(|msg| sink.send_message(msg).err())
                    .collect(),
                None => Vec::new(),
            };
            self.state.set_running(true);
            errors
        };

        let (wake_tx, wake_rx) = bounded(0);
        let ctx = SchedulerContext {
            state: Arc::clone(&self.state),
            sink: Arc::clone(&self.sink),
            observer: Arc::clone(&self.observer),
            settings: self.settings,
            wake_rx,
        };

        match thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || run_pulse_scheduler(ctx))
        {
            Ok(handle) => {
                *worker = Some(Worker { handle, wake_tx });
                Some(errors)
            }
            Err(e) => {
                error!("Failed to spawn clock thread: {}", e);
                self.abandon_run();
                None
            }
        }
    }

    /// Returns `None` when not running, otherwise the send error of Stop if any.
    fn stop_locked(&self, worker: &mut Option<Worker>) -> Option<Vec<MidiError>> {
        let Worker { handle, wake_tx } = worker.take()?;

        let result = self.send_stop();
        drop(wake_tx);

        if let Err(payload) = handle.join() {
            error!("Clock thread panicked; cannot guarantee clock output has stopped");
            panic::resume_unwind(payload);
        }

        Some(result.err().into_iter().collect())
    }

    /// Closes a run whose scheduler never started; Start already went out
    fn abandon_run(&self) {
        if let Err(e) = self.send_stop() {
            self.observer.on_send_error(&e);
        }
    }

    /// Emits Stop and clears the running flag while holding the sink gate, so
    /// the scheduler cannot slip a pulse in after Stop.
    fn send_stop(&self) -> Result<(), MidiError> {
        let slot = lock_sink(&self.sink);
        let result = match slot.as_ref() {
            Some(sink) => sink.send_message(&RealtimeMessage::Stop),
            None => Ok(()),
        };
        self.state.set_running(false);
        result
    }

    fn finish_transport(&self, outcome: Option<Vec<MidiError>>, event: TransportEvent) {
        let Some(errors) = outcome else {
            debug!("Ignoring redundant {:?} request", event);
            return;
        };
        for e in &errors {
            self.observer.on_send_error(e);
        }
        if event == TransportEvent::Started {
            info!("Clock running at {} BPM", self.bpm());
        }
        self.observer.on_transport(event);
    }
}

impl Drop for ClockEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
