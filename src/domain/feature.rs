//! Feature labels classifying instrumented calls

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ObservabilityError;

/// Classification of the kind of call being instrumented.
///
/// The label drives session correlation and trace handling: `Agent` runs the
/// trace step annotator over captured output and correlates on the agent
/// session marker, every other label correlates on `sessionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    /// Plain instrumented call with no feature-specific handling.
    #[serde(rename = "None")]
    None,
    /// Multi-step agent run carrying a nested execution trace.
    Agent,
    /// Knowledge-base retrieval call.
    #[serde(rename = "KB")]
    KnowledgeBase,
    /// Direct model invocation.
    InvokeModel,
}

impl FeatureName {
    /// Accepted wire spellings, in declaration order.
    pub const VALID_NAMES: [&'static str; 4] = ["None", "Agent", "KB", "InvokeModel"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Agent => "Agent",
            Self::KnowledgeBase => "KB",
            Self::InvokeModel => "InvokeModel",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Agent" => Ok(Self::Agent),
            "KB" => Ok(Self::KnowledgeBase),
            "InvokeModel" => Ok(Self::InvokeModel),
            other => Err(ObservabilityError::configuration(format!(
                "Invalid feature_name '{}'. Valid values are: {}",
                other,
                Self::VALID_NAMES.join(", ")
            ))),
        }
    }
}
