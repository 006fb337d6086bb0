//! ambifand library
//!
//! Runtime pieces of the sensor display daemon: acquisition, fallback input,
//! presentation sinks, control commands and the application lifecycle. The
//! binary in `main.rs` wires them to a frame timer, stdin and the terminal.

pub mod acquisition;
pub mod app;
pub mod config;
pub mod controls;
pub mod fallback;
pub mod presentation;
pub mod shutdown;

pub use acquisition::{Acquisition, AcquisitionOutcome};
pub use app::App;
pub use controls::ControlCommand;
pub use fallback::{FallbackInput, FallbackSource, FallbackSubscription};
pub use presentation::{JsonSink, PresentationSink, TerminalSink};
