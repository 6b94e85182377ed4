//! The observation record - the unit persisted per instrumented call

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use super::feature::FeatureName;

/// Experiment identifier used when the caller does not set one.
pub const DEFAULT_EXPERIMENT_ID: &str = "default_experiment_1";

/// One recorded invocation of an instrumented call.
///
/// Timing fields are wall-clock UTC; `duration` and `logging_duration` are
/// seconds. `extra` holds caller-supplied fields merged at the top level of
/// the persisted document.
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    pub experiment_id: String,
    /// Correlation id grouping observations of one logical run.
    pub run_id: String,
    /// Unique per call.
    pub observation_id: String,
    pub obs_timestamp: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds spent inside the wrapped call.
    pub duration: f64,
    pub input_log: Option<Value>,
    pub output_log: Option<Value>,
    pub call_type: String,
    pub feature_name: Option<FeatureName>,
    pub feedback_enabled: bool,
    /// Seconds spent assembling this record, dispatch excluded.
    pub logging_duration: f64,
    /// Open extension map. Entries land after the typed fields when the
    /// record is serialized, so a later entry wins on key collision.
    pub extra: Map<String, Value>,
}

impl ObservationRecord {
    /// Merges caller-supplied entries into the extension map, overwriting
    /// on collision. Callers control merge order by calling this in order.
    pub fn merge_extra(&mut self, entries: Map<String, Value>) {
        for (key, value) in entries {
            self.extra.insert(key, value);
        }
    }

    /// Renders the persisted JSON document: typed fields first, extension
    /// entries after, later values winning on collision.
    pub fn to_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("experiment_id".into(), json!(self.experiment_id));
        doc.insert("run_id".into(), json!(self.run_id));
        doc.insert("observation_id".into(), json!(self.observation_id));
        doc.insert(
            "obs_timestamp".into(),
            json!(self.obs_timestamp.to_rfc3339()),
        );
        doc.insert("start_time".into(), json!(self.start_time.to_rfc3339()));
        doc.insert("end_time".into(), json!(self.end_time.to_rfc3339()));
        doc.insert("duration".into(), json!(self.duration));
        doc.insert(
            "input_log".into(),
            self.input_log.clone().unwrap_or(Value::Null),
        );
        doc.insert(
            "output_log".into(),
            self.output_log.clone().unwrap_or(Value::Null),
        );
        doc.insert("call_type".into(), json!(self.call_type));
        doc.insert("feature_name".into(), json!(self.feature_name));
        doc.insert("feedback_enabled".into(), json!(self.feedback_enabled));
        doc.insert("logging_duration".into(), json!(self.logging_duration));

        for (key, value) in &self.extra {
            doc.insert(key.clone(), value.clone());
        }

        Value::Object(doc)
    }
}

impl Serialize for ObservationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
