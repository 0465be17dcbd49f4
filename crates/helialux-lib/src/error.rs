//! Unified error type for the helialux-lib crate.
//!
//! [`HelialuxError`] wraps module-specific errors (`DeviceError`, `ParseError`)
//! and domain-specific error kinds (`Config`, `Color`). A failed write carries
//! the [`WriteStage`] it died in. `From` impls allow `?` to propagate across
//! module boundaries.

use std::fmt;

use crate::device::DeviceError;
use crate::dispatch::WriteStage;
use crate::status::ParseError;

/// Unified error type for helialux-lib operations.
#[derive(Debug)]
pub enum HelialuxError {
    /// Transport error while querying the device.
    Device(DeviceError),
    /// The status payload could not be normalized.
    Parse(ParseError),
    /// The two-step write protocol failed at `stage`.
    Write {
        stage: WriteStage,
        source: DeviceError,
    },
    /// Standard I/O error (config persistence, simulator socket).
    Io(std::io::Error),
    /// Configuration error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for HelialuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelialuxError::Device(e) => write!(f, "{e}"),
            HelialuxError::Parse(e) => write!(f, "{e}"),
            HelialuxError::Write { stage, source } => {
                write!(f, "Write failed at {stage}: {source}")
            }
            HelialuxError::Io(e) => write!(f, "I/O error: {e}"),
            HelialuxError::Config(e) => write!(f, "Config error: {e}"),
            HelialuxError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for HelialuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HelialuxError::Device(e) => Some(e),
            HelialuxError::Parse(e) => Some(e),
            HelialuxError::Write { source, .. } => Some(source),
            HelialuxError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl HelialuxError {
    /// Whether this is a device communication failure (transport or write).
    ///
    /// The controller layer reports these as "communication failure" for the
    /// single characteristic request that triggered them.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            HelialuxError::Device(_) | HelialuxError::Parse(_) | HelialuxError::Write { .. }
        )
    }
}

impl From<DeviceError> for HelialuxError {
    fn from(e: DeviceError) -> Self {
        HelialuxError::Device(e)
    }
}

impl From<ParseError> for HelialuxError {
    fn from(e: ParseError) -> Self {
        HelialuxError::Parse(e)
    }
}

impl From<std::io::Error> for HelialuxError {
    fn from(e: std::io::Error) -> Self {
        HelialuxError::Io(e)
    }
}

/// Crate-level Result alias using [`HelialuxError`].
pub type Result<T> = std::result::Result<T, HelialuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_device_error() {
        let e: HelialuxError = DeviceError::Timeout("/statusvars.js".into()).into();
        assert!(matches!(e, HelialuxError::Device(DeviceError::Timeout(_))));
    }

    #[test]
    fn from_parse_error() {
        let e: HelialuxError = ParseError::ChannelCount(3).into();
        assert!(matches!(e, HelialuxError::Parse(ParseError::ChannelCount(3))));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: HelialuxError = io_err.into();
        assert!(matches!(e, HelialuxError::Io(_)));
    }

    #[test]
    fn display_device_error() {
        let e = HelialuxError::Device(DeviceError::HttpStatus {
            path: "/color",
            status: 500,
        });
        assert_eq!(e.to_string(), "Device returned HTTP 500 for /color");
    }

    #[test]
    fn display_write_error_names_stage() {
        let e = HelialuxError::Write {
            stage: WriteStage::OverrideRequested,
            source: DeviceError::Unreachable("refused".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("override requested"), "got: {msg}");
        assert!(msg.contains("refused"), "got: {msg}");
    }

    #[test]
    fn display_config_error() {
        let e = HelialuxError::Config("host is empty".into());
        assert_eq!(e.to_string(), "Config error: host is empty");
    }

    #[test]
    fn display_color_error() {
        let e = HelialuxError::Color("bad hex".into());
        assert_eq!(e.to_string(), "Color error: bad hex");
    }

    #[test]
    fn source_chains_write_error() {
        let e = HelialuxError::Write {
            stage: WriteStage::ChannelsRequested,
            source: DeviceError::Timeout("/color".into()),
        };
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("/color"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = HelialuxError::Color("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn communication_errors_are_classified() {
        assert!(HelialuxError::Device(DeviceError::Timeout("x".into())).is_communication());
        assert!(HelialuxError::Parse(ParseError::UnrecognizedShape("x".into())).is_communication());
        assert!(!HelialuxError::Config("x".into()).is_communication());
    }

    #[test]
    fn question_mark_propagation_device_to_helialux() {
        fn inner() -> crate::device::Result<()> {
            Err(DeviceError::Unreachable("refused".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, HelialuxError::Device(DeviceError::Unreachable(_))));
    }
}
