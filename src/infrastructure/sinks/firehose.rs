//! Streaming delivery of observation records

use async_trait::async_trait;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::Record;
use tracing::debug;

use crate::domain::{LogSink, ObservabilityError, ObservationRecord};

/// Delivery-stream operations the streaming sink depends on
#[async_trait]
pub trait DeliveryStreamClient: Send + Sync + std::fmt::Debug {
    async fn put_record(
        &self,
        stream_name: &str,
        data: Vec<u8>,
    ) -> Result<(), ObservabilityError>;
}

/// Submits each record to a named delivery stream.
///
/// Submit failures surface to the caller exactly as the client reported
/// them; this sink adds no wrapping of its own.
#[derive(Debug)]
pub struct FirehoseSink<C: DeliveryStreamClient> {
    client: C,
    stream_name: String,
}

impl<C: DeliveryStreamClient> FirehoseSink<C> {
    pub fn new(client: C, stream_name: impl Into<String>) -> Self {
        Self {
            client,
            stream_name: stream_name.into(),
        }
    }
}

#[async_trait]
impl<C: DeliveryStreamClient> LogSink for FirehoseSink<C> {
    async fn deliver(&self, record: &ObservationRecord) -> Result<(), ObservabilityError> {
        let data = serde_json::to_vec(&record.to_json()).map_err(|e| {
            ObservabilityError::serialization(format!("failed to encode observation record: {e}"))
        })?;

        self.client.put_record(&self.stream_name, data).await?;

        debug!(
            stream = %self.stream_name,
            observation_id = %record.observation_id,
            "record submitted to delivery stream"
        );
        Ok(())
    }
}

/// Firehose-backed implementation
#[derive(Debug, Clone)]
pub struct FirehoseStreamClient {
    client: aws_sdk_firehose::Client,
}

impl FirehoseStreamClient {
    /// Builds a client from the ambient AWS configuration.
    pub async fn connect() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_firehose::Client::new(&config),
        }
    }

    pub fn from_client(client: aws_sdk_firehose::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryStreamClient for FirehoseStreamClient {
    async fn put_record(
        &self,
        stream_name: &str,
        data: Vec<u8>,
    ) -> Result<(), ObservabilityError> {
        let record = Record::builder().data(Blob::new(data)).build().map_err(|e| {
            ObservabilityError::delivery(format!("failed to build firehose record: {e}"))
        })?;

        self.client
            .put_record()
            .delivery_stream_name(stream_name)
            .record(record)
            .send()
            .await
            .map_err(|err| {
                ObservabilityError::delivery_with(
                    format!("put_record failed for stream '{stream_name}'"),
                    err,
                )
            })?;

        Ok(())
    }
}
