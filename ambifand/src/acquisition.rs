//! Acquisition loop
//!
//! On a fixed wall-clock interval, pulls at most one line from the open port
//! and merges it into the reading. While disconnected the fallback fractions
//! are written straight into the reading instead.
//!
//! Read failures never change the connection state; the next interval simply
//! tries again.

use std::time::Duration;

use ambifan_core::config::SerialConfig;
use ambifan_core::{parse_line, AmbifanError, Limits, Reading};
use ambifan_hardware::{is_disconnect_error, PortManager, PortOpener};
use tracing::{debug, warn};

use crate::fallback::FallbackSource;

/// What one acquisition tick did
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// Interval not yet elapsed
    NotDue,
    /// Connected, but no complete line was available
    NoData,
    /// A line was parsed and merged; `skipped` fields were left unchanged
    Applied { skipped: usize },
    /// The line was rejected as a whole; the reading is unchanged
    Rejected(AmbifanError),
    /// Reading from the port failed; the connection is kept
    ReadFailed(AmbifanError),
    /// Disconnected; fallback fractions were applied
    Fallback,
}

/// Interval-driven acquisition state
#[derive(Debug)]
pub struct Acquisition {
    interval: Duration,
    elapsed: Duration,
    limits: Limits,
    min_line_length: usize,
    last_line: Option<String>,
}

impl Acquisition {
    pub fn new(serial: &SerialConfig, limits: Limits) -> Self {
        Self {
            interval: serial.poll_interval(),
            elapsed: Duration::ZERO,
            limits,
            min_line_length: serial.min_line_length,
            last_line: None,
        }
    }

    /// Last line successfully read from the port
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    /// Accumulate `dt`; true when the interval has elapsed.
    ///
    /// The accumulator restarts from zero on each boundary, so a long frame
    /// never triggers more than one acquisition.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Advance the timer and run one acquisition step when due.
    pub async fn tick<O, F>(
        &mut self,
        dt: Duration,
        ports: &mut PortManager<O>,
        reading: &mut Reading,
        fallback: &F,
    ) -> AcquisitionOutcome
    where
        O: PortOpener,
        F: FallbackSource + ?Sized,
    {
        if !self.advance(dt) {
            return AcquisitionOutcome::NotDue;
        }
        self.step(ports, reading, fallback).await
    }

    /// Run one acquisition step regardless of the timer.
    pub async fn step<O, F>(
        &mut self,
        ports: &mut PortManager<O>,
        reading: &mut Reading,
        fallback: &F,
    ) -> AcquisitionOutcome
    where
        O: PortOpener,
        F: FallbackSource + ?Sized,
    {
        let Some(transport) = ports.transport_mut() else {
            *reading = Reading::from_fractions(&fallback.fractions(), &self.limits);
            return AcquisitionOutcome::Fallback;
        };

        match transport.bytes_available() {
            Ok(0) => return AcquisitionOutcome::NoData,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to query {}: {}", transport.port_name(), e);
                return AcquisitionOutcome::ReadFailed(e);
            }
        }

        match transport.read_line().await {
            Ok(None) => AcquisitionOutcome::NoData,
            Ok(Some(line)) => {
                let outcome = self.apply_line(&line, reading);
                self.last_line = Some(line);
                outcome
            }
            Err(e) => {
                if is_disconnect_error(&e) {
                    warn!(
                        "Read from {} failed, device may be gone: {}",
                        transport.port_name(),
                        e
                    );
                } else {
                    warn!("Read from {} failed: {}", transport.port_name(), e);
                }
                AcquisitionOutcome::ReadFailed(e)
            }
        }
    }

    /// Parse `line` and merge the decoded fields into `reading`.
    pub fn apply_line(&self, line: &str, reading: &mut Reading) -> AcquisitionOutcome {
        match parse_line(line, &self.limits, self.min_line_length) {
            Ok(parsed) => {
                for problem in &parsed.skipped {
                    debug!("Skipped field in {:?}: {}", line, problem);
                }
                reading.merge(&parsed.reading);
                AcquisitionOutcome::Applied {
                    skipped: parsed.skipped.len(),
                }
            }
            Err(e) => {
                debug!("Rejected line {:?}: {}", line, e);
                AcquisitionOutcome::Rejected(e)
            }
        }
    }
}
