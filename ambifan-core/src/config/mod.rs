//! Configuration types for ambifan
//!
//! [`StaticConfig`] holds every startup-time parameter: serial settings, value
//! limits, fan animation tuning and display options. It is read once when the
//! daemon starts and stays immutable afterwards.

mod paths;
mod static_config;

pub use paths::default_config_path;
pub use static_config::{DisplayConfig, DisplayFormat, FanConfig, SerialConfig, StaticConfig};
