pub mod cli;
pub mod clock;
pub mod config;
pub mod logging;
pub mod midi;
pub mod state;
pub mod tui;

pub use cli::{handle_port_list, validate_port, Args};
pub use clock::{ClockEngine, ClockObserver, SchedulerSettings};
pub use config::ClockConfig;
pub use midi::{MidiSink, RealtimeMessage, RecordingSink};
pub use state::{ClockSnapshot, ClockState};
