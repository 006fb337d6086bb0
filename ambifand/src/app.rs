//! Application state and lifecycle
//!
//! [`App`] owns the reading, the port manager, the acquisition timer, the fan
//! animator and the optional presentation sink. The main loop drives it
//! through three hooks:
//!
//! - [`App::start`] connects when auto-connect is enabled
//! - [`App::tick`] runs once per frame: acquisition (on its own interval),
//!   fan animation and presentation
//! - [`App::shutdown`] closes the port
//!
//! Control commands arrive through [`App::handle_command`].

use std::ops::ControlFlow;
use std::time::Duration;

use ambifan_core::{
    ConnectionState, DisplayFrame, FanAnimator, FanState, Reading, StaticConfig,
};
use ambifan_hardware::{PortManager, PortOpener};
use tracing::{debug, info, warn};

use crate::acquisition::{Acquisition, AcquisitionOutcome};
use crate::controls::{ControlCommand, HELP};
use crate::fallback::{FallbackInput, FallbackSubscription};
use crate::presentation::PresentationSink;

pub struct App<O: PortOpener> {
    config: StaticConfig,
    ports: PortManager<O>,
    acquisition: Acquisition,
    animator: FanAnimator,
    reading: Reading,
    fan: FanState,
    fallback_input: FallbackInput,
    fallback: FallbackSubscription,
    sink: Option<Box<dyn PresentationSink>>,
}

impl<O: PortOpener> App<O> {
    pub fn new(
        config: StaticConfig,
        opener: O,
        sink: Option<Box<dyn PresentationSink>>,
    ) -> Self {
        let fallback_input = FallbackInput::new(config.fallback);
        let fallback = fallback_input.subscribe();
        let animator = FanAnimator::new(&config.fan);

        Self {
            ports: PortManager::new(opener),
            acquisition: Acquisition::new(&config.serial, config.limits),
            reading: Reading::from_fractions(&config.fallback, &config.limits),
            fan: *animator.state(),
            animator,
            fallback_input,
            fallback,
            sink,
            config,
        }
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn fan_state(&self) -> &FanState {
        &self.fan
    }

    pub fn connection_state(&self) -> &ConnectionState {
        self.ports.state()
    }

    pub fn last_line(&self) -> Option<&str> {
        self.acquisition.last_line()
    }

    /// Publishing side of the fallback input
    pub fn fallback_input(&self) -> &FallbackInput {
        &self.fallback_input
    }

    /// Connect at startup when auto-connect is enabled.
    ///
    /// A failure leaves the app disconnected on fallback values.
    pub fn start(&mut self) {
        if !self.config.serial.auto_connect {
            info!("Auto-connect disabled, using fallback values");
            self.report_status();
            return;
        }

        let preferred = self.config.serial.port.clone();
        self.connect(preferred.as_deref());
    }

    /// Advance by one frame of `dt`.
    pub async fn tick(&mut self, dt: Duration) -> AcquisitionOutcome {
        let outcome = self
            .acquisition
            .tick(dt, &mut self.ports, &mut self.reading, &self.fallback)
            .await;

        if let AcquisitionOutcome::Applied { skipped } = &outcome {
            if *skipped > 0 {
                debug!("{} field(s) kept their previous value", skipped);
            }
        }

        self.fan = self
            .animator
            .update(&self.reading, &self.config.limits, dt.as_secs_f32());

        self.present();
        outcome
    }

    /// Apply one control command. `Break` asks the main loop to stop.
    pub fn handle_command(&mut self, command: ControlCommand) -> ControlFlow<()> {
        debug!("Control command: {:?}", command);

        match command {
            ControlCommand::Connect(port) => self.connect(port.as_deref()),
            ControlCommand::Disconnect => {
                if self.ports.close() {
                    self.report_status();
                } else {
                    self.notify("Not connected");
                }
            }
            ControlCommand::ListPorts => match self.ports.list_ports() {
                Ok(ports) if ports.is_empty() => self.notify("No serial ports found"),
                Ok(ports) => self.notify(&format!("Serial ports: {}", ports.join(", "))),
                Err(e) => self.notify(&format!("Port enumeration failed: {}", e)),
            },
            ControlCommand::Set(field, fraction) => {
                self.fallback_input.set(field, fraction);
                if self.ports.is_connected() {
                    self.notify(&format!(
                        "Fallback {} set to {:.2} (used while disconnected)",
                        field, fraction
                    ));
                }
            }
            ControlCommand::Status => {
                let message = match self.last_line() {
                    Some(line) => format!("{} | last line: {}", self.ports.status(), line),
                    None => self.ports.status().to_string(),
                };
                self.notify(&message);
            }
            ControlCommand::Help => self.notify(HELP),
            ControlCommand::Quit => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    /// Close the port. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.ports.close() {
            info!("Serial port closed");
            self.report_status();
        }
    }

    fn connect(&mut self, port: Option<&str>) {
        let result = match port {
            Some(port) => self.ports.connect_to(port),
            None => self.ports.connect(),
        };

        if let Err(e) = result {
            warn!("Connection failed: {}", e);
        }
        self.report_status();
    }

    fn report_status(&mut self) {
        let status = self.ports.status().to_string();
        self.notify(&status);
    }

    fn notify(&mut self, message: &str) {
        info!("{}", message);
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.status(message) {
                warn!("Failed to show status: {}", e);
            }
        }
    }

    fn present(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let frame = DisplayFrame::new(
            self.reading,
            &self.config.limits,
            &self.fan,
            self.ports.state(),
        );
        if let Err(e) = sink.present(&frame) {
            warn!("Failed to present frame: {}", e);
        }
    }
}
