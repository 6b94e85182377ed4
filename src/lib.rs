//! # bedrock-observe
//!
//! Observability for Amazon Bedrock applications: wrap model and agent
//! calls, capture timing and payloads, correlate multi-step runs into an
//! ordered timeline, and ship structured observation records to a log sink.
//!
//! A recorder is configured once with a delivery target (`local`, `s3`, or
//! a Firehose delivery stream name) and then wraps any number of calls:
//!
//! ```rust,no_run
//! use bedrock_observe::{ObservationRecorder, RecorderConfig, WatchRequest};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let recorder = ObservationRecorder::connect(
//!     RecorderConfig::local().with_default_call_type("Converse-API"),
//! )
//! .await?;
//!
//! let observed = recorder
//!     .watch_ok(
//!         WatchRequest::new().with_input(json!({"sessionId": "s-1", "prompt": "what is rust"})),
//!         || async {
//!             // call the model endpoint here
//!             json!({"output": {"message": "a systems language"}})
//!         },
//!     )
//!     .await?;
//!
//! let record = observed.receipt.record().expect("local sink returns the record");
//! println!("took {}s in run {}", record.duration, record.run_id);
//! # Ok(())
//! # }
//! ```
//!
//! Multi-step agent runs (`FeatureName::Agent`) additionally get their
//! trace steps numbered and timed, and are correlated on the session marker
//! the agent runtime embeds in its traces.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod recorder;

pub use config::{LogFormat, LoggingConfig, RecorderConfig};
pub use domain::{
    DEFAULT_EXPERIMENT_ID, FeatureName, KeyPath, LogSink, ObservabilityError, ObservationRecord,
    PathSegment, SinkTarget, find_keys, resolve_session_id,
};
pub use infrastructure::logging::init_logging;
pub use recorder::{
    DeliveryReceipt, Observed, ObservationRecorder, WatchError, WatchRequest, Watcher,
};
