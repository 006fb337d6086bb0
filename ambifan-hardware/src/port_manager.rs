//! Port manager - owns the serial connection lifecycle
//!
//! Enumerates candidate ports, opens the first one that works and closes it
//! again on request. At most one port is open at a time.

use ambifan_core::{AmbifanError, ConnectionState, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::serial_driver::{self, LineTransport, SerialDriver};

/// Source of candidate ports and transports
///
/// The real implementation is [`SerialOpener`]; tests substitute their own.
pub trait PortOpener: Send {
    /// Candidate port names, in the order they should be tried
    fn list_ports(&self) -> Result<Vec<String>>;

    /// Open one port
    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>>;
}

/// Opens real serial ports through `tokio-serial`
#[derive(Debug, Clone)]
pub struct SerialOpener {
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialOpener {
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            baud_rate,
            read_timeout,
        }
    }
}

impl PortOpener for SerialOpener {
    fn list_ports(&self) -> Result<Vec<String>> {
        Ok(serial_driver::available_ports()?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>> {
        let driver = SerialDriver::open(port, self.baud_rate, self.read_timeout)?;
        Ok(Box::new(driver))
    }
}

/// Owns the open transport and the connection state
pub struct PortManager<O: PortOpener = SerialOpener> {
    opener: O,
    transport: Option<Box<dyn LineTransport>>,
    state: ConnectionState,
    status: String,
}

impl<O: PortOpener> PortManager<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            transport: None,
            state: ConnectionState::Disconnected,
            status: "Disconnected".to_string(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Latest human-readable status message
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Enumerate candidate ports
    pub fn list_ports(&self) -> Result<Vec<String>> {
        self.opener.list_ports()
    }

    /// The open transport, if any
    pub fn transport_mut(&mut self) -> Option<&mut (dyn LineTransport + 'static)> {
        self.transport.as_deref_mut()
    }

    /// Try every enumerated port in order and keep the first that opens
    ///
    /// Any open port is closed first. Fails with `NoPortsAvailable` when the
    /// enumeration is empty and `AllPortsFailed` when nothing opens.
    pub fn connect(&mut self) -> Result<String> {
        self.close();

        let ports = match self.opener.list_ports() {
            Ok(ports) => ports,
            Err(e) => {
                warn!("Port enumeration failed: {}", e);
                self.set_status(format!("Port enumeration failed: {}", e));
                return Err(e);
            }
        };

        if ports.is_empty() {
            warn!("No serial ports found");
            self.set_status("No serial ports found".to_string());
            return Err(AmbifanError::NoPortsAvailable);
        }

        debug!("Trying {} port(s): {:?}", ports.len(), ports);

        for port in &ports {
            match self.open_port(port) {
                Ok(()) => return Ok(port.clone()),
                Err(e) => debug!("Skipping {}: {}", port, e),
            }
        }

        let err = AmbifanError::AllPortsFailed {
            attempted: ports.len(),
        };
        warn!("{}", err);
        self.set_status(err.to_string());
        Err(err)
    }

    /// Open one specific port
    pub fn connect_to(&mut self, port: &str) -> Result<String> {
        self.close();

        match self.open_port(port) {
            Ok(()) => Ok(port.to_string()),
            Err(e) => {
                warn!("{}", e);
                self.set_status(e.to_string());
                Err(e)
            }
        }
    }

    /// Close the open port
    ///
    /// Safe to call when nothing is open. Returns whether a port was closed.
    pub fn close(&mut self) -> bool {
        match self.transport.take() {
            Some(transport) => {
                info!("Closing serial port {}", transport.port_name());
                drop(transport);
                self.state = ConnectionState::Disconnected;
                self.set_status("Disconnected".to_string());
                true
            }
            None => {
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    fn open_port(&mut self, port: &str) -> Result<()> {
        let mut transport = self.opener.open(port)?;

        if let Err(e) = transport.clear_input_buffer() {
            warn!("Could not clear stale input on {}: {}", port, e);
        }

        info!("Connected to {}", port);
        self.transport = Some(transport);
        self.state = ConnectionState::Connected(port.to_string());
        self.set_status(format!("Connected to {}", port));
        Ok(())
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
    }
}

impl<O: PortOpener> Drop for PortManager<O> {
    fn drop(&mut self) {
        self.close();
    }
}
