//! Static configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AmbifanError;
use crate::parser::DEFAULT_MIN_LINE_LENGTH;
use crate::types::{Fractions, Limits, RotationAxis, SensorField};

/// Serial port and acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate used when opening a port
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Acquisition interval in milliseconds
    pub poll_interval_ms: u64,
    /// Connect to the first available port at startup
    pub auto_connect: bool,
    /// Lines shorter than this (after trimming) are rejected
    pub min_line_length: usize,
    /// Preferred port, tried instead of enumerating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout_ms: 50,
            poll_interval_ms: 100,
            auto_connect: true,
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
            port: None,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fan animation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    /// Speed reached when every reading is at its limit
    pub max_speed: f32,
    /// Smoothing time constant in seconds
    pub smooth_time: f32,
    /// Degrees of rotation per unit of speed per second
    pub degrees_per_unit_speed: f32,
    /// Rotation axis
    pub axis: RotationAxis,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            max_speed: 500.0,
            smooth_time: 0.5,
            degrees_per_unit_speed: 1.0,
            axis: RotationAxis::Z,
        }
    }
}

/// How frames are written by the daemon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    /// Colored status line for a terminal
    #[default]
    Terminal,
    /// One JSON object per frame
    Json,
    /// No presentation output
    Headless,
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormat::Terminal => f.write_str("terminal"),
            DisplayFormat::Json => f.write_str("json"),
            DisplayFormat::Headless => f.write_str("headless"),
        }
    }
}

impl FromStr for DisplayFormat {
    type Err = AmbifanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" | "term" => Ok(DisplayFormat::Terminal),
            "json" => Ok(DisplayFormat::Json),
            "headless" | "none" => Ok(DisplayFormat::Headless),
            other => Err(AmbifanError::InvalidInput(format!(
                "Unknown display format '{}' (expected terminal, json or headless)",
                other
            ))),
        }
    }
}

/// Presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Frames per second for animation and presentation
    pub frame_rate_hz: u32,
    /// Output format
    pub format: DisplayFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30,
            format: DisplayFormat::Terminal,
        }
    }
}

impl DisplayConfig {
    /// Duration of one frame. A zero rate is treated as 1 Hz.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate_hz.max(1)
    }
}

/// Static configuration for the ambifan daemon.
///
/// Located at `~/.config/ambifan/config.toml` by default. Missing sections and
/// keys fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub serial: SerialConfig,
    pub limits: Limits,
    pub fan: FanConfig,
    pub display: DisplayConfig,
    /// Fractions used while disconnected, until changed at runtime
    pub fallback: Fractions,
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values that would break the reading invariants.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.limits.max_temperature.is_finite() || self.limits.max_temperature <= 0.0 {
            return Err(AmbifanError::Config(format!(
                "limits.max_temperature must be finite and positive, got {}",
                self.limits.max_temperature
            )));
        }
        if !self.limits.max_gas.is_finite() || self.limits.max_gas <= 0.0 {
            return Err(AmbifanError::Config(format!(
                "limits.max_gas must be finite and positive, got {}",
                self.limits.max_gas
            )));
        }
        if self.fan.max_speed < 0.0 || !self.fan.max_speed.is_finite() {
            return Err(AmbifanError::Config(format!(
                "fan.max_speed must be a finite, non-negative number, got {}",
                self.fan.max_speed
            )));
        }
        if !self.fan.smooth_time.is_finite() || self.fan.smooth_time <= 0.0 {
            return Err(AmbifanError::Config(format!(
                "fan.smooth_time must be finite and positive, got {}",
                self.fan.smooth_time
            )));
        }
        if !self.fan.degrees_per_unit_speed.is_finite() {
            return Err(AmbifanError::Config(format!(
                "fan.degrees_per_unit_speed must be finite, got {}",
                self.fan.degrees_per_unit_speed
            )));
        }
        for field in SensorField::ALL {
            let fraction = self.fallback.get(field);
            if !(0.0..=1.0).contains(&fraction) {
                return Err(AmbifanError::Config(format!(
                    "fallback.{} must be between 0.0 and 1.0, got {}",
                    field.name(),
                    fraction
                )));
            }
        }
        if self.serial.baud_rate == 0 {
            return Err(AmbifanError::Config(
                "serial.baud_rate must be non-zero".to_string(),
            ));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(AmbifanError::Config(
                "serial.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_static_config() {
        let config = StaticConfig::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.poll_interval_ms, 100);
        assert_eq!(config.serial.min_line_length, 10);
        assert!(config.serial.auto_connect);
        assert_eq!(config.display.format, DisplayFormat::Terminal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_static_config_serialization() {
        let config = StaticConfig::default();
        let toml_str = config.to_toml().unwrap();

        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[limits]"));
        assert!(toml_str.contains("[fan]"));
        assert!(toml_str.contains("axis = \"z\""));
        assert!(!toml_str.contains("port ="));
    }

    #[test]
    fn test_static_config_deserialization() {
        let toml_str = r#"
            [serial]
            baud_rate = 115200
            poll_interval_ms = 250
            auto_connect = false
            port = "/dev/ttyUSB0"

            [limits]
            max_temperature = 60.0
            max_gas = 2000.0

            [fan]
            max_speed = 720.0
            axis = "y"

            [display]
            format = "json"

            [fallback]
            temperature = 0.5
        "#;

        let config = StaticConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.poll_interval(), Duration::from_millis(250));
        assert!(!config.serial.auto_connect);
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        // Unspecified keys keep their defaults
        assert_eq!(config.serial.read_timeout_ms, 50);
        assert_eq!(config.limits.max_gas, 2000.0);
        assert_eq!(config.fan.max_speed, 720.0);
        assert_eq!(config.fan.smooth_time, 0.5);
        assert_eq!(config.fan.axis, RotationAxis::Y);
        assert_eq!(config.display.format, DisplayFormat::Json);
        assert_eq!(config.fallback.temperature, 0.5);
        assert_eq!(config.fallback.gas, 0.0);
    }

    #[test]
    fn test_static_config_empty_uses_defaults() {
        let config = StaticConfig::from_toml("").unwrap();
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.display.frame_rate_hz, 30);
    }

    #[test]
    fn test_static_config_roundtrip() {
        let mut config = StaticConfig::default();
        config.serial.port = Some("COM4".to_string());
        config.fan.axis = RotationAxis::X;

        let parsed = StaticConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.serial.port.as_deref(), Some("COM4"));
        assert_eq!(parsed.fan.axis, RotationAxis::X);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = StaticConfig::default();
        config.limits.max_temperature = 0.0;
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));

        let mut config = StaticConfig::default();
        config.limits.max_gas = -1.0;
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));

        let mut config = StaticConfig::default();
        config.serial.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = StaticConfig::default();
        config.limits.max_gas = f32::INFINITY;
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_nan_fallback() {
        let config = StaticConfig::from_toml("[fallback]\ntemperature = nan\n").unwrap();
        assert!(config.fallback.temperature.is_nan());
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_fallback() {
        let config = StaticConfig::from_toml("[fallback]\ngas = 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));

        let config = StaticConfig::from_toml("[fallback]\nhumidity = -0.1\n").unwrap();
        assert!(matches!(config.validate(), Err(AmbifanError::Config(_))));

        let config = StaticConfig::from_toml("[fallback]\nhumidity = 1.0\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fan_tuning() {
        for toml_str in [
            "[fan]\nsmooth_time = nan\n",
            "[fan]\nsmooth_time = -0.5\n",
            "[fan]\nsmooth_time = 0.0\n",
            "[fan]\ndegrees_per_unit_speed = nan\n",
            "[fan]\ndegrees_per_unit_speed = inf\n",
        ] {
            let config = StaticConfig::from_toml(toml_str).unwrap();
            assert!(
                matches!(config.validate(), Err(AmbifanError::Config(_))),
                "accepted {:?}",
                toml_str
            );
        }

        // Reverse rotation is allowed
        let config = StaticConfig::from_toml("[fan]\ndegrees_per_unit_speed = -1.0\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_display_format_from_str() {
        assert_eq!("json".parse::<DisplayFormat>().unwrap(), DisplayFormat::Json);
        assert_eq!(
            "Terminal".parse::<DisplayFormat>().unwrap(),
            DisplayFormat::Terminal
        );
        assert_eq!(
            "none".parse::<DisplayFormat>().unwrap(),
            DisplayFormat::Headless
        );
        assert!("xml".parse::<DisplayFormat>().is_err());
    }

    #[test]
    fn test_frame_period() {
        let display = DisplayConfig {
            frame_rate_hz: 50,
            ..Default::default()
        };
        assert_eq!(display.frame_period(), Duration::from_millis(20));

        let display = DisplayConfig {
            frame_rate_hz: 0,
            ..Default::default()
        };
        assert_eq!(display.frame_period(), Duration::from_secs(1));
    }
}
