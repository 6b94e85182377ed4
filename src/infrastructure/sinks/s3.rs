//! Object-storage persistence for observation records

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::domain::{LogSink, ObservabilityError, ObservationRecord};

const DEFAULT_REGION: &str = "us-east-1";

/// Object-store operations the S3 sink depends on
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + std::fmt::Debug {
    /// Whether the bucket exists; errors for anything other than a
    /// definite not-found answer.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObservabilityError>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ObservabilityError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), ObservabilityError>;
}

/// Persists each record as a JSON document in an object-storage bucket.
///
/// Any write failure is re-raised as a single delivery error carrying the
/// underlying cause.
#[derive(Debug)]
pub struct S3Sink<C: ObjectStoreClient> {
    client: C,
    bucket: String,
}

impl<C: ObjectStoreClient> S3Sink<C> {
    /// Builds the sink and makes sure the target bucket exists, creating it
    /// when absent. A pre-existing bucket is a no-op, not an error.
    pub async fn connect(
        client: C,
        bucket: impl Into<String>,
        region: &str,
    ) -> Result<Self, ObservabilityError> {
        let bucket = bucket.into();

        if client.bucket_exists(&bucket).await? {
            debug!(bucket = %bucket, "bucket already exists");
        } else {
            info!(bucket = %bucket, region = %region, "bucket does not exist, creating");
            client.create_bucket(&bucket, region).await?;
        }

        Ok(Self { client, bucket })
    }

    /// Object key for a record written now: experiment id plus the local
    /// wall-clock second of the write.
    pub fn object_key(experiment_id: &str) -> String {
        Self::object_key_at(experiment_id, Local::now())
    }

    fn object_key_at(experiment_id: &str, at: DateTime<Local>) -> String {
        format!(
            "logs/{}/{}_log.json",
            experiment_id,
            at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

#[async_trait]
impl<C: ObjectStoreClient> LogSink for S3Sink<C> {
    async fn deliver(&self, record: &ObservationRecord) -> Result<(), ObservabilityError> {
        let key = Self::object_key(&record.experiment_id);
        let body = serde_json::to_vec(&record.to_json()).map_err(|e| {
            ObservabilityError::serialization(format!("failed to encode observation record: {e}"))
        })?;

        self.client
            .put_object(&self.bucket, &key, body)
            .await
            .map_err(|source| {
                ObservabilityError::delivery_with(
                    format!("failed to save log to s3://{}/{}", self.bucket, key),
                    source,
                )
            })?;

        info!(bucket = %self.bucket, key = %key, "log saved to s3");
        Ok(())
    }
}

/// S3-backed implementation
#[derive(Debug, Clone)]
pub struct S3StoreClient {
    client: aws_sdk_s3::Client,
}

impl S3StoreClient {
    /// Builds a client against the given region using the ambient AWS
    /// credential chain.
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStoreClient for S3StoreClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObservabilityError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                {
                    Ok(false)
                } else {
                    Err(ObservabilityError::delivery_with(
                        format!("failed to check bucket '{bucket}'"),
                        err,
                    ))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ObservabilityError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // The default region rejects an explicit location constraint.
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(|err| {
            ObservabilityError::delivery_with(format!("failed to create bucket '{bucket}'"), err)
        })?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), ObservabilityError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|err| {
                ObservabilityError::delivery_with(format!("put_object failed for '{key}'"), err)
            })?;

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockObjectStore;
    use super::*;
    use crate::domain::{DEFAULT_EXPERIMENT_ID, FeatureName};
    use chrono::{TimeZone, Utc};
    use serde_json::{Map, Value, json};

    fn sample_record() -> ObservationRecord {
        let at = Utc::now();
        ObservationRecord {
            experiment_id: "exp-42".to_string(),
            run_id: "run-1".to_string(),
            observation_id: "obs-1".to_string(),
            obs_timestamp: at,
            start_time: at,
            end_time: at,
            duration: 1.5,
            input_log: Some(json!({"prompt": "hello"})),
            output_log: Some(json!({"completion": "world"})),
            call_type: "LLM".to_string(),
            feature_name: Some(FeatureName::InvokeModel),
            feedback_enabled: false,
            logging_duration: 0.002,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_object_key_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            S3Sink::<MockObjectStore>::object_key_at(DEFAULT_EXPERIMENT_ID, at),
            "logs/default_experiment_1/2024-03-09_14-05-07_log.json"
        );
    }

    #[tokio::test]
    async fn test_connect_creates_missing_bucket_with_region() {
        let client = MockObjectStore::new();
        let sink = S3Sink::connect(client, "obs-logs", "eu-west-1").await.unwrap();

        let created = sink.client.created_buckets.lock().unwrap().clone();
        assert_eq!(created, vec![("obs-logs".to_string(), "eu-west-1".to_string())]);
    }

    #[tokio::test]
    async fn test_connect_leaves_existing_bucket_alone() {
        let client = MockObjectStore::new().with_bucket("obs-logs");
        let sink = S3Sink::connect(client, "obs-logs", "us-east-1").await.unwrap();

        assert!(sink.client.created_buckets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_writes_one_document_that_round_trips() {
        let client = MockObjectStore::new().with_bucket("obs-logs");
        let sink = S3Sink::connect(client, "obs-logs", "us-east-1").await.unwrap();

        let record = sample_record();
        sink.deliver(&record).await.unwrap();

        let objects = sink.client.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);

        let (bucket, key, body) = &objects[0];
        assert_eq!(bucket, "obs-logs");
        assert!(key.starts_with("logs/exp-42/"));
        assert!(key.ends_with("_log.json"));

        let stored: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(stored, record.to_json());
    }

    #[tokio::test]
    async fn test_write_failure_is_wrapped_as_delivery_error() {
        let client = MockObjectStore::new()
            .with_bucket("obs-logs")
            .with_put_failure("access denied");
        let sink = S3Sink::connect(client, "obs-logs", "us-east-1").await.unwrap();

        let error = sink.deliver(&sample_record()).await.unwrap_err();
        match error {
            ObservabilityError::Delivery { message, source } => {
                assert!(message.contains("s3://obs-logs/logs/exp-42/"));
                assert!(source.unwrap().to_string().contains("access denied"));
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
    }
}
