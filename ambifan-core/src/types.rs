//! Shared types for sensor readings, connection state and the fan animation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AmbifanError;

/// Upper bound for relative humidity, in percent. Not configurable.
pub const HUMIDITY_LIMIT: f32 = 100.0;

/// Clamp `value` into `[0, limit]`.
#[inline]
pub fn clamp_to_limit(value: f32, limit: f32) -> f32 {
    value.clamp(0.0, limit.max(0.0))
}

/// Clamp `value` into `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp_fraction(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One of the three values carried by a sensor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorField {
    Humidity,
    Temperature,
    Gas,
}

impl SensorField {
    pub const ALL: [SensorField; 3] = [
        SensorField::Humidity,
        SensorField::Temperature,
        SensorField::Gas,
    ];

    /// Wire prefix, e.g. `H:` for humidity.
    pub fn prefix(&self) -> &'static str {
        match self {
            SensorField::Humidity => "H:",
            SensorField::Temperature => "T:",
            SensorField::Gas => "G:",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SensorField::Humidity => "humidity",
            SensorField::Temperature => "temperature",
            SensorField::Gas => "gas",
        }
    }

    /// Display unit for the value.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorField::Humidity => "%",
            SensorField::Temperature => "°C",
            SensorField::Gas => "ppm",
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorField {
    type Err = AmbifanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h" | "hum" | "humidity" => Ok(SensorField::Humidity),
            "t" | "temp" | "temperature" => Ok(SensorField::Temperature),
            "g" | "gas" => Ok(SensorField::Gas),
            other => Err(AmbifanError::InvalidInput(format!(
                "Unknown sensor field '{}' (expected temperature, humidity or gas)",
                other
            ))),
        }
    }
}

/// Upper bounds for temperature and gas readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum temperature in degrees Celsius
    pub max_temperature: f32,
    /// Maximum gas concentration
    pub max_gas: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_temperature: 50.0,
            max_gas: 1000.0,
        }
    }
}

impl Limits {
    /// Limit applied to the given field.
    pub fn limit_for(&self, field: SensorField) -> f32 {
        match field {
            SensorField::Humidity => HUMIDITY_LIMIT,
            SensorField::Temperature => self.max_temperature,
            SensorField::Gas => self.max_gas,
        }
    }
}

/// The latest sensor values.
///
/// Every field stays within `[0, limit]`: the parser clamps before merging and
/// fallback fractions are clamped before scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
    pub gas: f32,
}

impl Reading {
    pub fn get(&self, field: SensorField) -> f32 {
        match field {
            SensorField::Humidity => self.humidity,
            SensorField::Temperature => self.temperature,
            SensorField::Gas => self.gas,
        }
    }

    /// Overwrite only the fields present in `partial`.
    pub fn merge(&mut self, partial: &PartialReading) {
        if let Some(h) = partial.humidity {
            self.humidity = h;
        }
        if let Some(t) = partial.temperature {
            self.temperature = t;
        }
        if let Some(g) = partial.gas {
            self.gas = g;
        }
    }

    /// Scale fallback fractions into physical units.
    pub fn from_fractions(fractions: &Fractions, limits: &Limits) -> Self {
        Self {
            temperature: clamp_fraction(fractions.temperature) * limits.max_temperature,
            humidity: clamp_fraction(fractions.humidity) * HUMIDITY_LIMIT,
            gas: clamp_fraction(fractions.gas) * limits.max_gas,
        }
    }

    /// Each value divided by its limit, clamped to `[0, 1]`.
    ///
    /// A non-positive limit yields 0.
    pub fn normalized(&self, limits: &Limits) -> Fractions {
        let norm = |value: f32, limit: f32| {
            if limit > 0.0 {
                (value / limit).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };
        Fractions {
            temperature: norm(self.temperature, limits.max_temperature),
            humidity: norm(self.humidity, HUMIDITY_LIMIT),
            gas: norm(self.gas, limits.max_gas),
        }
    }
}

/// Fields decoded from one sensor line. Missing fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialReading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub gas: Option<f32>,
}

impl PartialReading {
    pub fn set(&mut self, field: SensorField, value: f32) {
        match field {
            SensorField::Humidity => self.humidity = Some(value),
            SensorField::Temperature => self.temperature = Some(value),
            SensorField::Gas => self.gas = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none() && self.gas.is_none()
    }
}

/// Values in `[0, 1]`, one per sensor field.
///
/// Supplied by the fallback source while disconnected and used for slider
/// positions in the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fractions {
    pub temperature: f32,
    pub humidity: f32,
    pub gas: f32,
}

impl Fractions {
    pub fn get(&self, field: SensorField) -> f32 {
        match field {
            SensorField::Humidity => self.humidity,
            SensorField::Temperature => self.temperature,
            SensorField::Gas => self.gas,
        }
    }

    /// Set one fraction, clamped to `[0, 1]`. NaN is stored as 0.
    pub fn set(&mut self, field: SensorField, value: f32) {
        let value = clamp_fraction(value);
        match field {
            SensorField::Humidity => self.humidity = value,
            SensorField::Temperature => self.temperature = value,
            SensorField::Gas => self.gas = value,
        }
    }

    /// Copy with every field clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            temperature: clamp_fraction(self.temperature),
            humidity: clamp_fraction(self.humidity),
            gas: clamp_fraction(self.gas),
        }
    }

    pub fn mean(&self) -> f32 {
        (self.temperature + self.humidity + self.gas) / 3.0
    }
}

/// Serial connection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No port open; readings come from the fallback source
    #[default]
    Disconnected,
    /// Port open; readings come from the device
    Connected(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    pub fn port_name(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected(port) => Some(port),
            ConnectionState::Disconnected => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected(port) => write!(f, "Connected to {}", port),
            ConnectionState::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// Animation state of the rotating fan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FanState {
    /// Smoothed angular speed
    pub current_speed: f32,
    /// Speed derived from the latest reading
    pub target_speed: f32,
    /// Velocity carried by the smoothing filter across frames
    pub velocity: f32,
    /// Rotation angle in degrees, `[0, 360)`
    pub angle: f32,
    /// Axis the angle is measured about
    pub axis: RotationAxis,
}

/// Axis the fan mesh rotates around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    X,
    Y,
    #[default]
    Z,
}

impl fmt::Display for RotationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationAxis::X => f.write_str("x"),
            RotationAxis::Y => f.write_str("y"),
            RotationAxis::Z => f.write_str("z"),
        }
    }
}

/// Everything a presentation sink renders for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFrame {
    pub reading: Reading,
    /// Slider positions, each value divided by its limit
    pub sliders: Fractions,
    pub fan_speed: f32,
    pub fan_angle: f32,
    pub fan_axis: RotationAxis,
    pub connected: bool,
    pub status: String,
}

impl DisplayFrame {
    pub fn new(
        reading: Reading,
        limits: &Limits,
        fan: &FanState,
        connection: &ConnectionState,
    ) -> Self {
        Self {
            reading,
            sliders: reading.normalized(limits),
            fan_speed: fan.current_speed,
            fan_angle: fan.angle,
            fan_axis: fan.axis,
            connected: connection.is_connected(),
            status: connection.to_string(),
        }
    }
}
