//! Service configuration.
//!
//! Settings come from an optional `orbitcast.toml` file and are then
//! overridden field by field from the environment. Every field has a default,
//! so an empty file (or no file at all) yields a working configuration.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [bus]
//! channel_capacity = 1024
//!
//! [propagation]
//! default_duration_minutes = 90
//! default_interval_seconds = 15
//! timeout_secs = 300
//! max_samples = 200000
//!
//! [visibility]
//! default_horizon_deg = 30.0
//! default_interval_seconds = 10
//!
//! [jobs]
//! retention_secs = 3600
//! max_finished = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::bus::DEFAULT_CHANNEL_CAPACITY;
use crate::models::{
    DEFAULT_DURATION_MINUTES, DEFAULT_HORIZON_DEG, DEFAULT_INTERVAL_SECONDS,
    DEFAULT_VISIBILITY_INTERVAL_SECONDS,
};

/// Name of the configuration file looked up in the standard locations.
pub const CONFIG_FILE_NAME: &str = "orbitcast.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Per-subscriber queue depth.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationSettings {
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
    #[serde(default = "default_interval_seconds")]
    pub default_interval_seconds: i64,
    /// Deadline for oracle-driven work, in seconds. Zero disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest batch a single request may produce.
    #[serde(default = "default_max_samples")]
    pub max_samples: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default = "default_horizon_deg")]
    pub default_horizon_deg: f64,
    #[serde(default = "default_visibility_interval_seconds")]
    pub default_interval_seconds: i64,
}

/// Retention of finished distribution jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Age after which a finished job is forgotten. Zero keeps them forever.
    #[serde(default = "default_job_retention_secs")]
    pub retention_secs: u64,
    /// Most finished jobs kept at once; the oldest go first. Zero disables the cap.
    #[serde(default = "default_max_finished_jobs")]
    pub max_finished: usize,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub propagation: PropagationSettings,
    #[serde(default)]
    pub visibility: VisibilitySettings,
    #[serde(default)]
    pub jobs: JobSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_duration_minutes() -> i64 {
    DEFAULT_DURATION_MINUTES
}

fn default_interval_seconds() -> i64 {
    DEFAULT_INTERVAL_SECONDS
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_samples() -> u64 {
    200_000
}

fn default_horizon_deg() -> f64 {
    DEFAULT_HORIZON_DEG
}

fn default_visibility_interval_seconds() -> i64 {
    DEFAULT_VISIBILITY_INTERVAL_SECONDS
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_max_finished_jobs() -> usize {
    1000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            default_duration_minutes: default_duration_minutes(),
            default_interval_seconds: default_interval_seconds(),
            timeout_secs: default_timeout_secs(),
            max_samples: default_max_samples(),
        }
    }
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            default_horizon_deg: default_horizon_deg(),
            default_interval_seconds: default_visibility_interval_seconds(),
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            retention_secs: default_job_retention_secs(),
            max_finished: default_max_finished_jobs(),
        }
    }
}

impl JobSettings {
    /// How long finished jobs stay queryable, or `None` for no age limit.
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }
}

impl PropagationSettings {
    /// The propagation deadline, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from the first `orbitcast.toml` found in the current directory,
    /// `backend/` or the parent directory. Falls back to defaults.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        match search_paths.iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// File configuration (if any) with environment overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_default_location()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields from the environment.
    ///
    /// # Environment Variables
    /// - `HOST`, `PORT`
    /// - `ORBITCAST_BUS_CAPACITY`
    /// - `ORBITCAST_PROPAGATION_TIMEOUT_SECS`
    /// - `ORBITCAST_MAX_SAMPLES`
    /// - `ORBITCAST_DEFAULT_HORIZON_DEG`
    /// - `ORBITCAST_VISIBILITY_INTERVAL_SECS`
    /// - `ORBITCAST_JOB_RETENTION_SECS`
    /// - `ORBITCAST_MAX_FINISHED_JOBS`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        override_from_env("PORT", &mut self.server.port)?;
        override_from_env("ORBITCAST_BUS_CAPACITY", &mut self.bus.channel_capacity)?;
        override_from_env(
            "ORBITCAST_PROPAGATION_TIMEOUT_SECS",
            &mut self.propagation.timeout_secs,
        )?;
        override_from_env("ORBITCAST_MAX_SAMPLES", &mut self.propagation.max_samples)?;
        override_from_env(
            "ORBITCAST_DEFAULT_HORIZON_DEG",
            &mut self.visibility.default_horizon_deg,
        )?;
        override_from_env(
            "ORBITCAST_VISIBILITY_INTERVAL_SECS",
            &mut self.visibility.default_interval_seconds,
        )?;
        override_from_env("ORBITCAST_JOB_RETENTION_SECS", &mut self.jobs.retention_secs)?;
        override_from_env("ORBITCAST_MAX_FINISHED_JOBS", &mut self.jobs.max_finished)?;
        Ok(())
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn override_from_env<T: FromStr>(name: &str, target: &mut T) -> Result<(), ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw.clone(),
            })?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}
