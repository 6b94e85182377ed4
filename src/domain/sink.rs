//! Delivery-target abstraction for observation records

use async_trait::async_trait;

use super::error::ObservabilityError;
use super::record::ObservationRecord;

/// Delivery-target string selecting the in-process passthrough sink.
pub const LOCAL_TARGET: &str = "local";

/// Delivery-target string selecting object-storage persistence.
pub const OBJECT_STORAGE_TARGET: &str = "s3";

/// Where a recorder delivers its records. Chosen once at construction and
/// immutable for the recorder's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// No I/O; the assembled record is handed straight back to the caller.
    Local,
    /// JSON documents written to an object-storage bucket.
    ObjectStorage,
    /// Records submitted one at a time to a named delivery stream.
    Stream(String),
}

impl SinkTarget {
    /// Parses a delivery-target string: exactly `local` or `s3` select
    /// those variants, any other non-empty value names a delivery stream.
    pub fn parse(target: &str) -> Result<Self, ObservabilityError> {
        match target {
            "" => Err(ObservabilityError::configuration(
                "delivery_target must be provided; use 'local' for the passthrough sink",
            )),
            LOCAL_TARGET => Ok(Self::Local),
            OBJECT_STORAGE_TARGET => Ok(Self::ObjectStorage),
            stream => Ok(Self::Stream(stream.to_string())),
        }
    }
}

/// A delivery target for assembled observation records.
///
/// One dispatch attempt is made per observation; retry policy belongs to
/// the caller of the instrumented function.
#[async_trait]
pub trait LogSink: Send + Sync + std::fmt::Debug {
    async fn deliver(&self, record: &ObservationRecord) -> Result<(), ObservabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserved_targets() {
        assert_eq!(SinkTarget::parse("local").unwrap(), SinkTarget::Local);
        assert_eq!(SinkTarget::parse("s3").unwrap(), SinkTarget::ObjectStorage);
    }

    #[test]
    fn test_parse_treats_other_values_as_stream_names() {
        assert_eq!(
            SinkTarget::parse("observability-stream").unwrap(),
            SinkTarget::Stream("observability-stream".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_target() {
        let error = SinkTarget::parse("").unwrap_err();
        assert!(error.is_configuration());
    }
}
