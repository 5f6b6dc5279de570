// config.rs

use crate::cli::Args;
use crate::clock::{SchedulerSettings, DEFAULT_MAX_SLEEP, DEFAULT_RESYNC_MULTIPLE};
use crate::state::DEFAULT_BPM;
use config::{Config, ConfigError as SourceError, Environment, File};
use log::{debug, info, LevelFilter};
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Base name of the optional config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "clocksyncrs";
pub const ENV_PREFIX: &str = "CLOCKSYNCRS";

pub const MIN_SLEEP_US: u64 = 100;
pub const MAX_SLEEP_US: u64 = 50_000;

#[derive(Debug)]
pub enum ConfigError {
    /// A config file or environment variable could not be read or parsed
    Load(String),
    /// A value was read but is outside its allowed range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl Error for ConfigError {}

impl From<SourceError> for ConfigError {
    fn from(e: SourceError) -> Self {
        ConfigError::Load(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub struct ClockConfig {
    pub bpm: f64,
    pub resync_multiple: u32,
    pub max_sleep_us: u64,
    pub output_port: Option<String>,
    pub output_index: Option<usize>,
    pub dry_run: bool,
    pub log_level: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            resync_multiple: DEFAULT_RESYNC_MULTIPLE,
            max_sleep_us: DEFAULT_MAX_SLEEP.as_micros() as u64,
            output_port: None,
            output_index: None,
            dry_run: false,
            log_level: "info".to_string(),
        }
    }
}

// Missing keys are fine, anything else is a real error
fn optional<T>(value: std::result::Result<T, SourceError>) -> Result<Option<T>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(SourceError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl ClockConfig {
    /// Loads defaults, then the config file, then `CLOCKSYNCRS_*` variables.
    ///
    /// With `path` the file must exist; otherwise `clocksyncrs.{toml,json,...}`
    /// in the working directory is used when present.
    pub fn from_sources(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                info!("Loading configuration from {}", p.display());
                File::from(p).required(true)
            }
            None => File::with_name(CONFIG_FILE_NAME).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut config = Self::default();
        if let Some(bpm) = optional(settings.get_float("bpm"))? {
            config.bpm = bpm;
        }
        if let Some(multiple) = optional(settings.get_int("resync_multiple"))? {
            config.resync_multiple = u32::try_from(multiple).map_err(|_| {
                ConfigError::Invalid(format!("resync_multiple out of range: {}", multiple))
            })?;
        }
        if let Some(sleep) = optional(settings.get_int("max_sleep_us"))? {
            config.max_sleep_us = u64::try_from(sleep).map_err(|_| {
                ConfigError::Invalid(format!("max_sleep_us out of range: {}", sleep))
            })?;
        }
        if let Some(port) = optional(settings.get_string("output_port"))? {
            config.output_port = Some(port);
        }
        if let Some(index) = optional(settings.get_int("output_index"))? {
            config.output_index = Some(usize::try_from(index).map_err(|_| {
                ConfigError::Invalid(format!("output_index out of range: {}", index))
            })?);
        }
        if let Some(dry_run) = optional(settings.get_bool("dry_run"))? {
            config.dry_run = dry_run;
        }
        if let Some(level) = optional(settings.get_string("log_level"))? {
            config.log_level = level;
        }

        debug!("Configuration from file and environment: {:?}", config);
        Ok(config)
    }

    /// Full layering: defaults, file, environment, then command line flags
    pub fn load(args: &Args) -> Result<Self> {
        let mut config = Self::from_sources(args.config.as_deref())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(bpm) = args.bpm {
            self.bpm = bpm;
        }
        if let Some(port) = &args.port {
            self.output_port = Some(port.clone());
        }
        if let Some(index) = args.port_index {
            self.output_index = Some(index);
        }
        if args.dry_run {
            self.dry_run = true;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.resync_multiple < 1 {
            return Err(ConfigError::Invalid(
                "resync_multiple must be at least 1".to_string(),
            ));
        }
        if !(MIN_SLEEP_US..=MAX_SLEEP_US).contains(&self.max_sleep_us) {
            return Err(ConfigError::Invalid(format!(
                "max_sleep_us must be between {} and {}, got {}",
                MIN_SLEEP_US, MAX_SLEEP_US, self.max_sleep_us
            )));
        }
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))?;
        Ok(())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            resync_multiple: self.resync_multiple,
            max_sleep: Duration::from_micros(self.max_sleep_us),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClockConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bpm, 120.0);
        assert_eq!(config.scheduler_settings(), SchedulerSettings::default());
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from(["test", "--bpm", "98.5", "--port", "IAC", "--dry-run"]);
        let mut config = ClockConfig::default();
        config.apply_args(&args);

        assert_eq!(config.bpm, 98.5);
        assert_eq!(config.output_port, Some("IAC".to_string()));
        assert!(config.dry_run);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClockConfig {
            resync_multiple: 0,
            ..ClockConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ClockConfig {
            max_sleep_us: 1_000_000,
            ..ClockConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ClockConfig {
            log_level: "loud".to_string(),
            ..ClockConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_log_level() {
        let config = ClockConfig {
            log_level: "debug".to_string(),
            ..ClockConfig::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Debug);
    }
}
