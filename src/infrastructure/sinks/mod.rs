//! Sink implementations for the supported delivery targets

mod factory;
mod firehose;
mod local;
mod s3;

pub use factory::SinkFactory;
pub use firehose::{DeliveryStreamClient, FirehoseSink, FirehoseStreamClient};
pub use local::LocalSink;
pub use s3::{ObjectStoreClient, S3Sink, S3StoreClient};
