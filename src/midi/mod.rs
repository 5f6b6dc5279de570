//! MIDI output for ClockSyncRS
//!
//! This module provides everything the clock needs to talk to the outside world:
//! - Real-time message encoding (Timing Clock, Start, Stop, Song Position)
//! - The [`MidiSink`] trait the engine writes raw bytes to
//! - [`MidirSink`] for real MIDI device output via midir
//! - [`RecordingSink`] for tests and dry runs
//!
mod message;
pub mod midir_sink;
pub mod mock_sink;
mod sink;

pub use message::{
    RealtimeMessage, CONTINUE, MAX_SONG_POSITION, SONG_POSITION_POINTER, START, STOP,
    TIMING_CLOCK,
};
pub use midir_sink::{list_output_ports, MidirSink};
pub use mock_sink::{RecordingSink, SentByte};
pub use sink::{MidiError, MidiSink, Result};
