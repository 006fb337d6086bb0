//! Serial driver for low-level sensor board communication
//!
//! Provides line-oriented async serial input from the sensor board.

use ambifan_core::{AmbifanError, Result};
use async_trait::async_trait;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::timeout;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, warn};

/// Trait for line transport abstraction
///
/// This trait enables testing of the port manager and the acquisition loop
/// without real hardware by allowing mock implementations.
#[async_trait]
pub trait LineTransport: Send {
    /// Number of bytes waiting to be read, including already buffered bytes
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one line, without its terminator
    ///
    /// Returns `Ok(None)` when the read timeout expires before a full line
    /// arrives. Partial data is kept and completed by the next call.
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Clear the input buffer
    fn clear_input_buffer(&mut self) -> Result<()>;

    /// Name of the underlying port
    fn port_name(&self) -> &str;
}

/// Serial driver for the sensor board
pub struct SerialDriver {
    reader: BufReader<SerialStream>,
    port_name: String,
    timeout_duration: Duration,
    pending: Vec<u8>,
}

impl SerialDriver {
    /// Open a serial port
    ///
    /// The port is opened 8N1 without flow control. DTR and RTS are asserted
    /// so boards that reset on those lines start streaming.
    ///
    /// # Arguments
    /// * `port_name` - Serial device (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Line speed
    /// * `read_timeout` - Timeout for a single line read
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        debug!("Opening serial port: {} at {} baud", port_name, baud_rate);

        let mut port = tokio_serial::new(port_name, baud_rate)
            .timeout(read_timeout)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                debug!("Failed to open serial port {}: {}", port_name, e);
                AmbifanError::OpenFailed {
                    port: port_name.to_string(),
                    reason: e.to_string(),
                }
            })?;

        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to assert DTR on {}: {}", port_name, e);
        }
        if let Err(e) = port.write_request_to_send(true) {
            warn!("Failed to assert RTS on {}: {}", port_name, e);
        }

        debug!("Serial port {} opened successfully", port_name);

        Ok(Self {
            reader: BufReader::new(port),
            port_name: port_name.to_string(),
            timeout_duration: read_timeout,
            pending: Vec::new(),
        })
    }
}

#[async_trait]
impl LineTransport for SerialDriver {
    fn bytes_available(&mut self) -> Result<usize> {
        let waiting = self.reader.get_ref().bytes_to_read().map_err(|e| {
            AmbifanError::Read(format!("Failed to query {}: {}", self.port_name, e))
        })?;
        Ok(self.reader.buffer().len() + self.pending.len() + waiting as usize)
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let result = timeout(
            self.timeout_duration,
            self.reader.read_until(b'\n', &mut self.pending),
        )
        .await;

        match result {
            Err(_) => {
                if !self.pending.is_empty() {
                    debug!("Holding {} bytes of a partial line", self.pending.len());
                }
                Ok(None)
            }
            Ok(Ok(0)) => {
                warn!("Serial port returned EOF - device may have been disconnected");
                Err(AmbifanError::Read(
                    "Serial port returned EOF - device may have been unplugged".to_string(),
                ))
            }
            Ok(Ok(_)) => {
                let line = String::from_utf8_lossy(&self.pending)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                self.pending.clear();
                debug!("RX: {:?}", line);
                Ok(Some(line))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Ok(Err(e)) => {
                error!("Read error on {}: {}", self.port_name, e);
                Err(AmbifanError::Read(e.to_string()))
            }
        }
    }

    fn clear_input_buffer(&mut self) -> Result<()> {
        let buffered = self.reader.buffer().len();
        Pin::new(&mut self.reader).consume(buffered);
        self.pending.clear();

        self.reader
            .get_ref()
            .clear(tokio_serial::ClearBuffer::Input)
            .map_err(|e| {
                warn!("Failed to clear input buffer: {}", e);
                AmbifanError::Serial(format!("Failed to clear buffer: {}", e))
            })
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Determine if an error suggests the device is gone
///
/// Returns `true` for read errors that usually mean the device was unplugged
/// rather than a transient glitch. Used for diagnostics only; the connection
/// is not dropped automatically.
pub fn is_disconnect_error(err: &AmbifanError) -> bool {
    match err {
        AmbifanError::Read(msg) | AmbifanError::Serial(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("eof")
                || msg_lower.contains("broken pipe")
                || msg_lower.contains("no such device")
                || msg_lower.contains("device not configured")
                || msg_lower.contains("input/output error")
        }
        _ => false,
    }
}

/// A serial port reported by the operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports in the order the OS reports them
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = tokio_serial::available_ports().map_err(|e| {
        error!("Failed to enumerate serial ports: {}", e);
        AmbifanError::Serial(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let description = match &port.port_type {
                tokio_serial::SerialPortType::UsbPort(info) => format!(
                    "USB {:04X}:{:04X}{}",
                    info.vid,
                    info.pid,
                    info.product
                        .as_ref()
                        .map(|p| format!(" {}", p))
                        .unwrap_or_default()
                ),
                tokio_serial::SerialPortType::PciPort => "PCI".to_string(),
                tokio_serial::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                tokio_serial::SerialPortType::Unknown => "Unknown".to_string(),
            };
            PortInfo {
                name: port.port_name,
                description,
            }
        })
        .collect())
}
