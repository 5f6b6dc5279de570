//! MIDI clock generation: the transport controller and its timing thread.
//!
//! [`ClockEngine`] is the caller-facing side. Each run spawns one scheduler
//! thread that emits Timing Clock pulses at the interval derived from the
//! current BPM; stopping joins that thread before returning.

mod engine;
mod observer;
mod scheduler;

pub use engine::ClockEngine;
pub use observer::{ClockObserver, LogObserver, NullObserver, TransportEvent};
pub use scheduler::{SchedulerSettings, SinkSlot, DEFAULT_MAX_SLEEP, DEFAULT_RESYNC_MULTIPLE};
