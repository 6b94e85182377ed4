use thiserror::Error;

/// Core observability errors
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Construction-time contract violation. Nothing is partially
    /// initialized when this surfaces.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A captured payload did not satisfy the trace contract.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A payload could not be rendered as JSON.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Dispatch to the configured sink failed.
    #[error("Delivery error: {message}")]
    Delivery {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ObservabilityError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            source: None,
        }
    }

    pub fn delivery_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Delivery {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error belongs to the construction-time class.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let error = ObservabilityError::configuration("delivery_target must be provided");
        assert_eq!(
            error.to_string(),
            "Configuration error: delivery_target must be provided"
        );
        assert!(error.is_configuration());
    }

    #[test]
    fn test_validation_error_display() {
        let error = ObservabilityError::validation("bad trace node");
        assert_eq!(error.to_string(), "Validation error: bad trace node");
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_delivery_error_carries_source() {
        let cause = std::io::Error::other("socket closed");
        let error = ObservabilityError::delivery_with("failed to save log", cause);

        assert_eq!(error.to_string(), "Delivery error: failed to save log");
        let source = std::error::Error::source(&error).expect("source retained");
        assert_eq!(source.to_string(), "socket closed");
    }
}
