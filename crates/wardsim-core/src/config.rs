use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sample rate of the backend's PCM payloads.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,

    /// How much scheduled-ahead audio the playback queue can hold.
    #[serde(default = "default_queue_secs")]
    pub queue_secs: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            enabled: default_true(),
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            queue_secs: default_queue_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// How long a transcript waits for audio before being shown unsynced.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Shortest re-check sleep when a display deadline has not quite been
    /// reached on the audio clock.
    #[serde(default = "default_min_wake_ms")]
    pub min_wake_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
            min_wake_ms: default_min_wake_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_patient_id")]
    pub patient_id: String,

    #[serde(default = "default_gender")]
    pub gender: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            patient_id: default_patient_id(),
            gender: default_gender(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_device_name() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_buffer_size() -> u32 {
    1024
}

fn default_queue_secs() -> u32 {
    30
}

fn default_grace_period_ms() -> u64 {
    2000
}

fn default_min_wake_ms() -> u64 {
    10
}

fn default_patient_id() -> String {
    "p001".to_string()
}

fn default_gender() -> String {
    "female".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                tracing::debug!(var = var_name, "interpolated environment variable");
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                tracing::warn!(var = var_name, "environment variable not set");
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }
}
