//! Error types for the ambifan system

use thiserror::Error;

/// Core error type for ambifan operations
#[derive(Error, Debug)]
pub enum AmbifanError {
    /// Port enumeration returned no candidates
    #[error("No serial ports available")]
    NoPortsAvailable,

    /// A single port could not be opened
    #[error("Failed to open serial port {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// Every enumerated port failed to open
    #[error("Could not open any of {attempted} serial port(s)")]
    AllPortsFailed { attempted: usize },

    /// Read returned nothing within the port timeout (expected, benign)
    #[error("Read timed out")]
    ReadTimeout,

    /// Any other read failure (logged, connection kept)
    #[error("Read error: {0}")]
    Read(String),

    /// Line empty or shorter than the sanity threshold
    #[error("Malformed line: {0:?}")]
    MalformedLine(String),

    /// Line did not split into exactly three fields
    #[error("Wrong field count: expected 3, found {found}")]
    WrongFieldCount { found: usize },

    /// Field prefix is not one of `H:`, `T:` or `G:`
    #[error("Unknown field prefix: {0:?}")]
    UnknownFieldPrefix(String),

    /// Field value is not a valid decimal number
    #[error("Failed to parse {field} value {value:?}")]
    FieldParseFailure { field: &'static str, value: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serial port errors outside of open/read
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ambifan operations
pub type Result<T> = std::result::Result<T, AmbifanError>;

impl From<serde_json::Error> for AmbifanError {
    fn from(err: serde_json::Error) -> Self {
        AmbifanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AmbifanError = json_err.into();

        match err {
            AmbifanError::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AmbifanError = io_err.into();

        match err {
            AmbifanError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = AmbifanError::NoPortsAvailable;
        assert_eq!(format!("{}", err), "No serial ports available");

        let err = AmbifanError::OpenFailed {
            port: "/dev/ttyUSB0".to_string(),
            reason: "busy".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Failed to open serial port /dev/ttyUSB0: busy"
        );

        let err = AmbifanError::AllPortsFailed { attempted: 3 };
        assert_eq!(format!("{}", err), "Could not open any of 3 serial port(s)");

        let err = AmbifanError::WrongFieldCount { found: 2 };
        assert_eq!(format!("{}", err), "Wrong field count: expected 3, found 2");

        let err = AmbifanError::FieldParseFailure {
            field: "temperature",
            value: "-".to_string(),
        };
        assert_eq!(format!("{}", err), "Failed to parse temperature value \"-\"");
    }
}
