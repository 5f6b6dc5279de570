use chrono::Local;
use log::LevelFilter;
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Directory the session logs are written to
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("clocksyncrs")
        .join("logs"))
}

/// Log file for today's sessions, e.g. `clock-2026-10-18.log`
pub fn log_file_name() -> String {
    format!("clock-{}.log", Local::now().format("%Y-%m-%d"))
}

/// Sends log output to a dated file under the user's data directory.
///
/// Only the first call installs the logger; later calls report whether that
/// first installation succeeded.
pub fn init_logger(level: LevelFilter) -> Result<(), Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(log_file_name()))?;

    // Thread names make it obvious which lines came from the clock thread
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Names)
        .build();

    INIT.call_once(|| {
        if let Ok(()) = CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)]) {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_is_dated() {
        let name = log_file_name();
        assert!(name.starts_with("clock-"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "clock-YYYY-MM-DD.log".len());
    }
}
