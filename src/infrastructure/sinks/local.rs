//! In-process passthrough sink

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{LogSink, ObservabilityError, ObservationRecord};

/// Keeps records in-process: no I/O, the assembled record goes straight
/// back to the caller.
///
/// Useful for tests and development, and as the baseline sink before an
/// experiment is pointed at real delivery infrastructure.
#[derive(Debug, Default)]
pub struct LocalSink;

impl LocalSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for LocalSink {
    async fn deliver(&self, record: &ObservationRecord) -> Result<(), ObservabilityError> {
        debug!(
            observation_id = %record.observation_id,
            run_id = %record.run_id,
            "observation kept local"
        );
        Ok(())
    }
}
