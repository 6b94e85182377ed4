//! Sink factory for construction-time target selection

use std::sync::Arc;

use crate::config::RecorderConfig;
use crate::domain::{LogSink, ObservabilityError, SinkTarget};

use super::firehose::{FirehoseSink, FirehoseStreamClient};
use super::local::LocalSink;
use super::s3::{S3Sink, S3StoreClient};

/// Factory for building the sink a configuration names
#[derive(Debug)]
pub struct SinkFactory;

impl SinkFactory {
    /// Builds the configured sink. Configuration problems are rejected
    /// before any AWS client is constructed; for the object-storage target
    /// the bucket is provisioned as part of construction.
    pub async fn create(config: &RecorderConfig) -> Result<Arc<dyn LogSink>, ObservabilityError> {
        match config.validate()? {
            SinkTarget::Local => Ok(Arc::new(LocalSink::new())),
            SinkTarget::ObjectStorage => {
                let bucket = config.require_bucket()?.to_string();
                let client = S3StoreClient::connect(&config.s3_region).await;
                let sink = S3Sink::connect(client, bucket, &config.s3_region).await?;
                Ok(Arc::new(sink))
            }
            SinkTarget::Stream(stream_name) => {
                let client = FirehoseStreamClient::connect().await;
                Ok(Arc::new(FirehoseSink::new(client, stream_name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Construction-time contract violations must surface before any AWS
    // client is built, so these paths are safe to exercise offline.

    #[tokio::test]
    async fn test_create_rejects_missing_target() {
        let error = SinkFactory::create(&RecorderConfig::default())
            .await
            .unwrap_err();
        assert!(error.is_configuration());
    }

    #[tokio::test]
    async fn test_create_rejects_object_storage_without_bucket() {
        let error = SinkFactory::create(&RecorderConfig::new("s3"))
            .await
            .unwrap_err();
        assert!(error.is_configuration());
    }

    #[tokio::test]
    async fn test_create_builds_local_sink_without_io() {
        let sink = SinkFactory::create(&RecorderConfig::local()).await.unwrap();
        assert!(format!("{sink:?}").contains("LocalSink"));
    }
}
