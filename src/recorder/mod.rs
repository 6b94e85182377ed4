//! The observation recorder - wraps target calls with instrumentation and
//! routes the assembled record to the configured sink

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::RecorderConfig;
use crate::domain::{
    FeatureName, LogSink, ObservabilityError, ObservationRecord, SinkTarget, annotate_trace_steps,
    resolve_session_id,
};
use crate::infrastructure::sinks::SinkFactory;

/// Failure of one wrapped invocation.
#[derive(Debug, Error)]
pub enum WatchError<E> {
    /// The wrapped call itself failed. Nothing was dispatched; the error
    /// comes back exactly as the call produced it.
    #[error("instrumented call failed")]
    Call(E),

    /// Instrumentation failed after the call completed. The call's result
    /// is dropped rather than returned unobserved.
    #[error(transparent)]
    Observe(#[from] ObservabilityError),
}

impl<E> WatchError<E> {
    /// The target call's own error, when that is what failed.
    pub fn into_call_error(self) -> Option<E> {
        match self {
            Self::Call(error) => Some(error),
            Self::Observe(_) => None,
        }
    }
}

/// What the sink handed back for one observation.
///
/// The shape follows the configured target and the feedback flag: the local
/// sink always returns the record, the AWS sinks return the record or the
/// correlation ids only when feedback is enabled.
#[derive(Debug, Clone)]
pub enum DeliveryReceipt {
    /// The full assembled record.
    Record(ObservationRecord),
    /// Correlation handles for feedback collection.
    Ids {
        run_id: String,
        observation_id: String,
    },
    /// Delivered with nothing further to report.
    Delivered,
}

impl DeliveryReceipt {
    /// The record, when this receipt carries one.
    pub fn record(&self) -> Option<&ObservationRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// The wrapped call's own result plus the delivery receipt.
#[derive(Debug)]
pub struct Observed<T> {
    pub result: T,
    pub receipt: DeliveryReceipt,
}

/// Per-invocation wrap configuration.
///
/// Input and output capture default to on; disabling one omits that payload
/// from the record without affecting the call itself. `input` follows the
/// single-payload convention: it stands for the call's first argument, not
/// the whole argument list.
#[derive(Debug, Clone)]
pub struct WatchRequest {
    capture_input: bool,
    capture_output: bool,
    call_type: Option<String>,
    input: Option<Value>,
    additional_metadata: Map<String, Value>,
    user_prompt: Map<String, Value>,
}

impl Default for WatchRequest {
    fn default() -> Self {
        Self {
            capture_input: true,
            capture_output: true,
            call_type: None,
            input: None,
            additional_metadata: Map::new(),
            user_prompt: Map::new(),
        }
    }
}

impl WatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The payload to record as `input_log`.
    pub fn with_input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Overrides the recorder's default call-type label for this call.
    pub fn with_call_type(mut self, call_type: impl Into<String>) -> Self {
        self.call_type = Some(call_type.into());
        self
    }

    pub fn capture_input(mut self, capture: bool) -> Self {
        self.capture_input = capture;
        self
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Adds one caller-supplied field, merged into the record's top level.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_metadata.insert(key.into(), value.into());
        self
    }

    /// Merges a whole mapping of caller-supplied fields.
    pub fn with_additional_metadata(mut self, entries: Map<String, Value>) -> Self {
        self.additional_metadata.extend(entries);
        self
    }

    /// Prompt-related fields merged after `additional_metadata`, so they
    /// win on key collision.
    pub fn with_user_prompt(mut self, entries: Map<String, Value>) -> Self {
        self.user_prompt.extend(entries);
        self
    }
}

/// A wrap configuration bound to a recorder: configure once, instrument
/// many calls with it.
#[derive(Debug)]
pub struct Watcher<'a> {
    recorder: &'a ObservationRecorder,
    template: WatchRequest,
}

impl Watcher<'_> {
    /// Instruments one fallible call, recording `input` when input capture
    /// is enabled on the template.
    pub async fn call<T, E, F, Fut>(
        &self,
        input: impl Into<Value>,
        call: F,
    ) -> Result<Observed<T>, WatchError<E>>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut request = self.template.clone();
        request.input = Some(input.into());
        self.recorder.watch(request, call).await
    }

    /// Instruments one infallible call.
    pub async fn call_ok<T, F, Fut>(
        &self,
        input: impl Into<Value>,
        call: F,
    ) -> Result<Observed<T>, ObservabilityError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut request = self.template.clone();
        request.input = Some(input.into());
        self.recorder.watch_ok(request, call).await
    }
}

/// Wraps target calls with instrumentation.
///
/// One recorder owns one sink and one step counter. The counter grows
/// monotonically across every call made through the same instance and is
/// only reset by constructing a new recorder; concurrent calls through one
/// instance interleave step numbers in scheduling order.
#[derive(Debug)]
pub struct ObservationRecorder {
    config: RecorderConfig,
    target: SinkTarget,
    sink: Arc<dyn LogSink>,
    step_counter: AtomicU64,
}

impl ObservationRecorder {
    /// Validates the configuration and builds the configured sink. For the
    /// object-storage target this provisions the bucket; nothing is
    /// partially initialized when validation fails.
    pub async fn connect(config: RecorderConfig) -> Result<Self, ObservabilityError> {
        let target = config.validate()?;
        let sink = SinkFactory::create(&config).await?;

        Ok(Self {
            config,
            target,
            sink,
            step_counter: AtomicU64::new(0),
        })
    }

    /// Builds a recorder around a caller-supplied sink, keeping the
    /// configured target's return-shape contract.
    pub fn with_sink(
        config: RecorderConfig,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ObservabilityError> {
        let target = config.validate()?;

        Ok(Self {
            config,
            target,
            sink,
            step_counter: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Binds a reusable wrap configuration to this recorder, the decorator
    /// shape: one configuration, many instrumented calls.
    pub fn watcher(&self, template: WatchRequest) -> Watcher<'_> {
        Watcher {
            recorder: self,
            template,
        }
    }

    /// The step number the trace annotator will hand out next.
    pub fn step_count(&self) -> u64 {
        self.step_counter.load(Ordering::SeqCst)
    }

    /// Instruments one fallible call.
    ///
    /// The call runs exactly as it would unwrapped; its failure propagates
    /// as [`WatchError::Call`] before any record is dispatched. On success
    /// the assembled record takes one dispatch attempt through the
    /// configured sink and the call's own result comes back in
    /// [`Observed`], alongside whatever the sink's contract returns.
    pub async fn watch<T, E, F, Fut>(
        &self,
        request: WatchRequest,
        call: F,
    ) -> Result<Observed<T>, WatchError<E>>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let WatchRequest {
            capture_input,
            capture_output,
            call_type,
            input,
            additional_metadata,
            user_prompt,
        } = request;

        // Wrapper start: the latency baseline for the first agent trace
        // step, deliberately ahead of the tighter call bracket below.
        let request_start = Utc::now();
        let request_start_epoch = epoch_seconds(request_start);

        let input_log = if capture_input { input } else { None };

        let observation_id = Uuid::new_v4().to_string();
        let obs_timestamp = Utc::now();

        let start_time = Utc::now();
        let call_started = Instant::now();
        let result = call().await.map_err(WatchError::Call)?;
        let duration = call_started.elapsed().as_secs_f64();
        let end_time = Utc::now();

        let logging_started = Instant::now();

        let mut output_log = if capture_output {
            Some(serde_json::to_value(&result).map_err(|e| {
                ObservabilityError::serialization(format!("failed to capture output: {e}"))
            })?)
        } else {
            None
        };

        let run_id = self.correlate(&mut output_log, input_log.as_ref(), request_start_epoch)?;

        let mut record = ObservationRecord {
            experiment_id: self.config.experiment_id.clone(),
            run_id: run_id.clone(),
            observation_id: observation_id.clone(),
            obs_timestamp,
            start_time,
            end_time,
            duration,
            input_log,
            output_log,
            call_type: call_type.unwrap_or_else(|| self.config.default_call_type.clone()),
            feature_name: self.config.feature_name,
            feedback_enabled: self.config.feedback_enabled,
            logging_duration: 0.0,
            extra: Map::new(),
        };
        record.merge_extra(additional_metadata);
        record.merge_extra(user_prompt);
        record.logging_duration = logging_started.elapsed().as_secs_f64();

        self.sink.deliver(&record).await.map_err(WatchError::from)?;

        debug!(
            observation_id = %observation_id,
            run_id = %run_id,
            duration_s = duration,
            "observation recorded"
        );

        Ok(Observed {
            result,
            receipt: self.receipt(record, run_id, observation_id),
        })
    }

    /// Instruments an infallible call.
    pub async fn watch_ok<T, F, Fut>(
        &self,
        request: WatchRequest,
        call: F,
    ) -> Result<Observed<T>, ObservabilityError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.watch::<T, Infallible, _, _>(request, || async move { Ok(call().await) })
            .await
            .map_err(|error| match error {
                WatchError::Observe(e) => e,
                WatchError::Call(never) => match never {},
            })
    }

    /// Feature-specific session correlation. For agent runs with captured
    /// output the trace steps are annotated first and the session id comes
    /// from the first annotated element; every other shape resolves from
    /// the captured input.
    fn correlate(
        &self,
        output_log: &mut Option<Value>,
        input_log: Option<&Value>,
        request_start_epoch: f64,
    ) -> Result<String, ObservabilityError> {
        match (self.config.feature_name, output_log.as_mut()) {
            (Some(FeatureName::Agent), Some(output)) => {
                annotate_trace_steps(output, request_start_epoch, &self.step_counter)?;
                let first = output.as_array().and_then(|elements| elements.first());
                Ok(resolve_session_id(first, self.config.feature_name))
            }
            _ => Ok(resolve_session_id(input_log, self.config.feature_name)),
        }
    }

    fn receipt(
        &self,
        record: ObservationRecord,
        run_id: String,
        observation_id: String,
    ) -> DeliveryReceipt {
        match &self.target {
            SinkTarget::Local => DeliveryReceipt::Record(record),
            SinkTarget::ObjectStorage if self.config.feedback_enabled => {
                DeliveryReceipt::Record(record)
            }
            SinkTarget::Stream(_) if self.config.feedback_enabled => DeliveryReceipt::Ids {
                run_id,
                observation_id,
            },
            _ => DeliveryReceipt::Delivered,
        }
    }
}

fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1e6
}
