//! Recorder and logging configuration

use serde::Deserialize;

use crate::domain::{
    DEFAULT_EXPERIMENT_ID, FeatureName, LOCAL_TARGET, ObservabilityError, SinkTarget,
};

/// Construction-time configuration for an observation recorder.
///
/// Invalid values are rejected eagerly by [`RecorderConfig::validate`]
/// before any sink resource is touched.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// `local`, `s3`, or the name of a delivery stream.
    pub delivery_target: String,
    pub experiment_id: String,
    /// Call-type label applied when a wrap does not override it.
    pub default_call_type: String,
    pub feature_name: Option<FeatureName>,
    /// Selects the richer return shape of the AWS sinks.
    pub feedback_enabled: bool,
    /// Required when the delivery target is `s3`.
    pub s3_bucket_name: Option<String>,
    pub s3_region: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            delivery_target: String::new(),
            experiment_id: DEFAULT_EXPERIMENT_ID.to_string(),
            default_call_type: "LLM".to_string(),
            feature_name: None,
            feedback_enabled: false,
            s3_bucket_name: None,
            s3_region: "us-east-1".to_string(),
        }
    }
}

impl RecorderConfig {
    pub fn new(delivery_target: impl Into<String>) -> Self {
        Self {
            delivery_target: delivery_target.into(),
            ..Self::default()
        }
    }

    /// Configuration for the in-process passthrough sink.
    pub fn local() -> Self {
        Self::new(LOCAL_TARGET)
    }

    pub fn with_experiment_id(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = experiment_id.into();
        self
    }

    pub fn with_default_call_type(mut self, call_type: impl Into<String>) -> Self {
        self.default_call_type = call_type.into();
        self
    }

    pub fn with_feature_name(mut self, feature_name: FeatureName) -> Self {
        self.feature_name = Some(feature_name);
        self
    }

    pub fn with_feedback(mut self, enabled: bool) -> Self {
        self.feedback_enabled = enabled;
        self
    }

    pub fn with_bucket(mut self, bucket_name: impl Into<String>) -> Self {
        self.s3_bucket_name = Some(bucket_name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.s3_region = region.into();
        self
    }

    /// Loads configuration from `config/default`, `config/local` and
    /// `OBSERVE__`-prefixed environment variables, later sources winning,
    /// then validates it.
    pub fn load() -> Result<Self, ObservabilityError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("OBSERVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ObservabilityError::configuration(format!("failed to load configuration: {e}"))
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            ObservabilityError::configuration(format!("invalid configuration: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the construction-time contract: a delivery target is present
    /// and object storage has a bucket name. Returns the parsed target.
    pub fn validate(&self) -> Result<SinkTarget, ObservabilityError> {
        let target = SinkTarget::parse(&self.delivery_target)?;
        if target == SinkTarget::ObjectStorage {
            self.require_bucket()?;
        }
        Ok(target)
    }

    pub(crate) fn require_bucket(&self) -> Result<&str, ObservabilityError> {
        match self.s3_bucket_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ObservabilityError::configuration(
                "s3_bucket_name must be provided when delivery_target is 's3'",
            )),
        }
    }
}

/// Diagnostics output configuration for embedding applications.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_contract() {
        let config = RecorderConfig::default();

        assert_eq!(config.experiment_id, "default_experiment_1");
        assert_eq!(config.default_call_type, "LLM");
        assert_eq!(config.s3_region, "us-east-1");
        assert!(config.feature_name.is_none());
        assert!(!config.feedback_enabled);
    }

    #[test]
    fn test_validate_requires_delivery_target() {
        let error = RecorderConfig::default().validate().unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_validate_requires_bucket_for_object_storage() {
        let error = RecorderConfig::new("s3").validate().unwrap_err();
        assert!(error.is_configuration());

        let target = RecorderConfig::new("s3")
            .with_bucket("observability-logs")
            .validate()
            .unwrap();
        assert_eq!(target, SinkTarget::ObjectStorage);
    }

    #[test]
    fn test_validate_ignores_bucket_for_other_targets() {
        assert_eq!(
            RecorderConfig::local().validate().unwrap(),
            SinkTarget::Local
        );
        assert_eq!(
            RecorderConfig::new("my-stream").validate().unwrap(),
            SinkTarget::Stream("my-stream".to_string())
        );
    }

    #[test]
    fn test_empty_bucket_name_is_rejected() {
        let error = RecorderConfig::new("s3")
            .with_bucket("")
            .validate()
            .unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RecorderConfig =
            serde_json::from_str(r#"{"delivery_target": "local", "feature_name": "Agent"}"#)
                .unwrap();

        assert_eq!(config.delivery_target, "local");
        assert_eq!(config.feature_name, Some(FeatureName::Agent));
        assert_eq!(config.experiment_id, "default_experiment_1");
    }
}
