//! Session correlation for observation records

use serde_json::Value;
use uuid::Uuid;

use super::feature::FeatureName;
use super::search::find_keys;

/// Session marker carried by agent-style traces.
pub const AGENT_SESSION_KEY: &str = "x-amz-bedrock-agent-session-id";

/// Session marker for every other call shape.
pub const SESSION_KEY: &str = "sessionId";

/// Resolves the correlation id for one observation.
///
/// Probes the payload for the feature-specific marker key and takes the
/// first match in depth-first traversal order; a payload carrying the key
/// more than once silently resolves to that first match. With no payload or
/// no match a fresh unique id is minted instead, so every observation ends
/// up with a run id.
pub fn resolve_session_id(payload: Option<&Value>, feature: Option<FeatureName>) -> String {
    let key = match feature {
        Some(FeatureName::Agent) => AGENT_SESSION_KEY,
        _ => SESSION_KEY,
    };

    payload
        .and_then(|data| {
            find_keys(data, key)
                .into_iter()
                .next()
                .map(|(_, value)| session_id_value(value))
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// Session markers are strings in practice; anything else is carried over in
// its JSON rendering rather than dropped.
fn session_id_value(value: &Value) -> String {
    match value {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}
