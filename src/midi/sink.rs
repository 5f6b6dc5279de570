use super::message::RealtimeMessage;
use std::error::Error;
use std::fmt;

/// Custom error type for MIDI output operations
#[derive(Debug, Clone, PartialEq)]
pub enum MidiError {
    /// Error when sending bytes to the device
    SendError(String),
    /// Error when opening or connecting to a MIDI device
    ConnectionError(String),
    /// No output port matched the requested name or index
    PortNotFound(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
            MidiError::PortNotFound(msg) => write!(f, "MIDI output port not found: {}", msg),
        }
    }
}

impl Error for MidiError {}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl From<midir::PortInfoError> for MidiError {
    fn from(e: midir::PortInfoError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl<T> From<midir::ConnectError<T>> for MidiError {
    fn from(e: midir::ConnectError<T>) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl From<midir::SendError> for MidiError {
    fn from(e: midir::SendError) -> Self {
        MidiError::SendError(e.to_string())
    }
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Destination for the raw bytes the clock produces.
///
/// Implementations must be cheap to call from the timing thread: sends are
/// expected to be buffered or otherwise non-blocking.
pub trait MidiSink: Send + Sync {
    /// Transmits one raw MIDI byte
    fn send_byte(&self, byte: u8) -> Result<()>;

    /// Transmits `bytes` in order, without interleaving other sends
    fn send_bytes(&self, bytes: &[u8]) -> Result<()>;

    fn send_message(&self, msg: &RealtimeMessage) -> Result<()> {
        match msg.to_bytes().as_slice() {
            [byte] => self.send_byte(*byte),
            bytes => self.send_bytes(bytes),
        }
    }
}
