// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the file record store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where per-check logs and their archives live.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_secs: u64,

    /// Upper bound on probes in flight within one cycle.
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Without this, alerts only go to the process log.
    #[serde(default)]
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;

        if let Some(twilio) = &self.notifier.twilio {
            if twilio.account_sid.is_empty() || twilio.auth_token.is_empty() {
                bail!("notifier.twilio requires account_sid and auth_token");
            }
            if twilio.from_phone.is_empty() {
                bail!("notifier.twilio.from_phone must not be empty");
            }
        }

        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            bail!("metrics.path must start with '/'");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            logs_dir: default_logs_dir(),
            scheduler: SchedulerConfig::default(),
            notifier: NotifierConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.probe_interval_secs == 0 {
            bail!("scheduler.probe_interval_secs must be greater than 0");
        }
        if self.rotation_interval_secs == 0 {
            bail!("scheduler.rotation_interval_secs must be greater than 0");
        }
        if self.max_concurrent_probes == 0 {
            bail!("scheduler.max_concurrent_probes must be greater than 0");
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            rotation_interval_secs: default_rotation_interval(),
            max_concurrent_probes: default_max_concurrent_probes(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".data")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from(".logs")
}

fn default_probe_interval() -> u64 {
    60
}

fn default_rotation_interval() -> u64 {
    60 * 60 * 24
}

fn default_max_concurrent_probes() -> usize {
    64
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
