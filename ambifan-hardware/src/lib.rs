//! ambifan-hardware
//!
//! Hardware crate that contains the low-level serial line driver and the port
//! manager that owns the connection lifecycle. Used by the daemon to read
//! sensor lines from the board.
//!
//! Public API:
//! - `port_manager::PortManager`: enumerate, open and close ports
//! - `serial_driver::SerialDriver`: line-oriented serial input
//! - `serial_driver::available_ports`: OS port enumeration with descriptions
//! - `testing`: scripted transports for tests

pub mod port_manager;
pub mod serial_driver;
pub mod testing;

pub use port_manager::{PortManager, PortOpener, SerialOpener};
pub use serial_driver::{
    available_ports, is_disconnect_error, LineTransport, PortInfo, SerialDriver,
};
