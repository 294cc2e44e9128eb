//! Configuration management.

use anyhow::{Context, Result};
use blinkystrip_hw::strip::protocol::MAX_LED_COUNT;
use blinkystrip_hw::DEFAULT_LED_COUNT;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schedule::MAX_OVERRIDE_MINUTES;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Optional log file, written in addition to stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,

    /// Strip connection settings
    #[serde(default)]
    pub strip: StripConfig,

    /// Display schedule settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// GPU temperature effect settings
    #[serde(default)]
    pub gpu: GpuConfig,
}

/// Strip connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripConfig {
    /// Serial port path or "auto" for auto-detection
    #[serde(default = "default_device")]
    pub device: String,

    /// Number of LEDs on the strip
    #[serde(default = "default_led_count")]
    pub led_count: usize,

    /// Hold pixels until show instead of writing each one
    #[serde(default = "default_true")]
    pub buffered: bool,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            led_count: default_led_count(),
            buffered: true,
        }
    }
}

/// Hours during which the strip may show colors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Apply the schedule at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// First hour (0-23, local time) of the display window
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// Hour (0-24, local time) at which the display window closes
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Default override duration in minutes
    #[serde(default = "default_override_minutes")]
    pub override_minutes: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            override_minutes: default_override_minutes(),
        }
    }
}

/// GPU temperature effect configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuConfig {
    /// Command whose output contains the GPU temperature
    #[serde(default = "default_gpu_command")]
    pub command: String,

    /// Poll interval in milliseconds
    #[serde(default = "default_gpu_poll")]
    pub poll: u64,

    /// Process names that count as a running game (empty = always active)
    #[serde(default)]
    pub games: Vec<String>,

    /// Color shown while no game is running
    #[serde(default = "default_idle_color")]
    pub idle_color: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            command: default_gpu_command(),
            poll: default_gpu_poll(),
            games: Vec::new(),
            idle_color: default_idle_color(),
        }
    }
}

// Default value functions
fn default_device() -> String {
    "auto".to_string()
}

fn default_led_count() -> usize {
    DEFAULT_LED_COUNT
}

fn default_true() -> bool {
    true
}

fn default_start_hour() -> u32 {
    16
}

fn default_end_hour() -> u32 {
    23
}

fn default_override_minutes() -> i64 {
    30
}

fn default_gpu_command() -> String {
    "nvidia-smi".to_string()
}

fn default_gpu_poll() -> u64 {
    2000
}

fn default_idle_color() -> String {
    "black".to_string()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Rejects values that cannot describe a strip or a schedule.
    pub fn validate(&self) -> Result<()> {
        if self.strip.led_count > MAX_LED_COUNT {
            anyhow::bail!("strip.led_count must be at most {}", MAX_LED_COUNT);
        }
        if self.schedule.start_hour > 23 {
            anyhow::bail!("schedule.start_hour must be between 0 and 23");
        }
        if self.schedule.end_hour > 24 {
            anyhow::bail!("schedule.end_hour must be between 0 and 24");
        }
        if !(1..=MAX_OVERRIDE_MINUTES).contains(&self.schedule.override_minutes) {
            anyhow::bail!(
                "schedule.override_minutes must be between 1 and {}",
                MAX_OVERRIDE_MINUTES
            );
        }
        Ok(())
    }
}
