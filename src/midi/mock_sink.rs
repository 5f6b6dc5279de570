use crate::midi::{MidiError, MidiSink, Result, TIMING_CLOCK};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A byte and the moment it reached the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentByte {
    pub byte: u8,
    pub at: Instant,
}

/// In-memory sink that records everything it is asked to send.
///
/// Used by tests and by the `--dry-run` mode of the binary. When switched to
/// failing mode every send returns an error and nothing is recorded.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentByte>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn sent(&self) -> MutexGuard<'_, Vec<SentByte>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.sent().iter().map(|s| s.byte).collect()
    }

    pub fn events(&self) -> Vec<SentByte> {
        self.sent().clone()
    }

    /// Arrival times of every Timing Clock byte, in order
    pub fn clock_times(&self) -> Vec<Instant> {
        self.sent()
            .iter()
            .filter(|s| s.byte == TIMING_CLOCK)
            .map(|s| s.at)
            .collect()
    }

    pub fn clock_count(&self) -> usize {
        self.sent().iter().filter(|s| s.byte == TIMING_CLOCK).count()
    }

    pub fn len(&self) -> usize {
        self.sent().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent().is_empty()
    }

    pub fn clear(&self) {
        self.sent().clear();
    }
}

impl MidiSink for RecordingSink {
    fn send_byte(&self, byte: u8) -> Result<()> {
        self.send_bytes(&[byte])
    }

    fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MidiError::SendError("recording sink is failing".into()));
        }
        let mut sent = self.sent();
        let at = Instant::now();
        sent.extend(bytes.iter().map(|&byte| SentByte { byte, at }));
        Ok(())
    }
}
