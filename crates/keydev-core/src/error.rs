use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Errors that can occur across the keydev pipeline.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use keydev_core::KeydevError;
///
/// let err = KeydevError::Config("window_days must be positive".into());
/// assert!(err.to_string().contains("window_days"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum KeydevError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A change-set record is malformed or missing a required field.
    ///
    /// Recoverable per configuration: the record can be skipped with a
    /// warning, or the whole dataset run can abort.
    #[error("malformed change set '{record}': {reason}")]
    DataFormat {
        /// Commit hash (or position) identifying the offending record.
        record: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The event log violates chronological ordering.
    ///
    /// Always fatal for the dataset: window correctness depends on strict
    /// ordering. Results checkpointed before the failure remain valid.
    #[error(
        "change set '{record}' at {timestamp} is earlier than the previously read {previous}"
    )]
    OutOfOrder {
        /// Commit hash of the offending record.
        record: String,
        /// Timestamp of the offending record.
        timestamp: DateTime<Utc>,
        /// Timestamp of the record read before it.
        previous: DateTime<Utc>,
    },

    /// A metric could not be computed from the current graph state.
    #[error("computation error: {0}")]
    Computation(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KeydevError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn data_format_error_names_the_record() {
        let err = KeydevError::DataFormat {
            record: "a1b2c3".into(),
            reason: "empty file list".into(),
        };
        assert!(err.to_string().contains("a1b2c3"));
        assert!(err.to_string().contains("empty file list"));
    }

    #[test]
    fn out_of_order_error_shows_both_timestamps() {
        let err = KeydevError::OutOfOrder {
            record: "deadbeef".into(),
            timestamp: Utc.with_ymd_and_hms(2019, 1, 1, 12, 0, 0).unwrap(),
            previous: Utc.with_ymd_and_hms(2019, 1, 2, 12, 0, 0).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deadbeef"));
        assert!(msg.contains("2019-01-01"));
        assert!(msg.contains("2019-01-02"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = KeydevError::FileNotFound(PathBuf::from("/tmp/missing.json"));
        assert!(err.to_string().contains("/tmp/missing.json"));
    }
}
