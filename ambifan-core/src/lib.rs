//! ambifan Core Library
//!
//! Shared types, the sensor line parser, the fan animator, and static
//! configuration for the ambifan sensor display. Used by both the hardware
//! crate and the daemon.

pub mod config;
pub mod error;
pub mod fan;
pub mod parser;
pub mod smoothing;
pub mod types;

// Re-export commonly used types
pub use config::{default_config_path, StaticConfig};
pub use error::*;
pub use fan::FanAnimator;
pub use parser::{parse_line, ParsedLine};
pub use smoothing::SmoothDamp;
pub use types::*;
