//! Error handling for PM-table decoding.

use ryzenmon_rs_core::SensorError;
use thiserror::Error;

/// Result type for PM-table operations
pub type Result<T> = std::result::Result<T, PmTableError>;

/// Errors raised while binding a raw PM-table buffer to a typed view.
///
/// Both variants are deterministic for a given input: retrying the same
/// decode cannot succeed, so callers surface them rather than loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmTableError {
    /// The firmware reports a table revision with no registered layout.
    #[error("unsupported PM table version 0x{version:06X}")]
    UnsupportedVersion { version: u32 },

    /// The raw buffer is smaller than the revision's declared table size.
    #[error(
        "PM table buffer too small for version 0x{version:06X}: expected {expected} bytes, got {actual}"
    )]
    BufferTooSmall {
        version: u32,
        expected: usize,
        actual: usize,
    },
}

impl From<PmTableError> for SensorError {
    fn from(err: PmTableError) -> Self {
        match err {
            PmTableError::UnsupportedVersion { .. } => {
                SensorError::unavailable(err.to_string(), false)
            }
            PmTableError::BufferTooSmall { .. } => SensorError::invalid_data(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_version_and_sizes() {
        let err = PmTableError::UnsupportedVersion { version: 0x370003 };
        assert_eq!(err.to_string(), "unsupported PM table version 0x370003");

        let err = PmTableError::BufferTooSmall {
            version: 0x380904,
            expected: 1444,
            actual: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x380904"));
        assert!(msg.contains("1444"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn conversion_into_sensor_error() {
        let err: SensorError = PmTableError::UnsupportedVersion { version: 0x123456 }.into();
        assert!(matches!(err, SensorError::Unavailable { is_temporary: false, .. }));

        let err: SensorError = PmTableError::BufferTooSmall {
            version: 0x380904,
            expected: 1444,
            actual: 0,
        }
        .into();
        assert!(matches!(err, SensorError::InvalidData { .. }));
    }
}
