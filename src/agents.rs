use serde_json::{Map, Value};

/// Decoded shape of an agent-list payload
///
/// The agent-listing collaborator does not guarantee a stable response shape:
/// depending on the backend version it may return a bare array, an object
/// wrapping the array under `agents` or `agentnames`, or an arbitrary object
/// whose values hold the names. This enum is the single place that shape
/// variance is decoded; everything downstream works with the tagged variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAgentResponse {
    /// Payload was a bare JSON array
    List(Vec<Value>),

    /// Payload was an object with an `agents` array
    Agents(Vec<Value>),

    /// Payload was an object with an `agentnames` array
    AgentNames(Vec<Value>),

    /// Payload was some other object; values are flattened one level
    Map(Map<String, Value>),

    /// Payload was null, missing, or an unrecognized primitive
    Empty,
}

/// Decode an agent-list payload into its recognized shape
///
/// Shapes are tried in a fixed priority order: bare array, then the `agents`
/// key, then the `agentnames` key, then any other object, then the empty
/// fallback. A key only matches when its value is actually an array, so
/// `{"agents": "x"}` falls through to the generic map branch.
///
/// # Arguments
/// * `raw` - The payload as received from the collaborator
///
/// # Returns
/// * `RawAgentResponse` - The decoded shape; never an error
pub fn classify(raw: &Value) -> RawAgentResponse {
    match raw {
        Value::Array(items) => RawAgentResponse::List(items.clone()),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("agents") {
                RawAgentResponse::Agents(items.clone())
            } else if let Some(Value::Array(items)) = map.get("agentnames") {
                RawAgentResponse::AgentNames(items.clone())
            } else {
                RawAgentResponse::Map(map.clone())
            }
        }
        _ => RawAgentResponse::Empty,
    }
}

/// Normalize an agent-list payload into a flat list of display strings
///
/// Defensive-parsing contract: whatever the collaborator sent back, this
/// returns a list (possibly empty), never an error. Ordering and duplicates
/// are preserved as received; nothing is sorted or deduplicated.
///
/// For the generic-map fallback the values are taken in key arrival order;
/// array values are flattened exactly one level, scalar values contribute a
/// single element, and null values contribute nothing.
///
/// # Arguments
/// * `raw` - The payload as received from the collaborator
///
/// # Returns
/// * `Vec<String>` - Flat ordered list of agent identifiers
pub fn normalize(raw: &Value) -> Vec<String> {
    match classify(raw) {
        RawAgentResponse::List(items)
        | RawAgentResponse::Agents(items)
        | RawAgentResponse::AgentNames(items) => items.iter().map(display_string).collect(),
        RawAgentResponse::Map(map) => {
            let mut agents = Vec::new();
            for value in map.values() {
                match value {
                    Value::Array(items) => agents.extend(items.iter().map(display_string)),
                    Value::Null => {}
                    other => agents.push(display_string(other)),
                }
            }
            agents
        }
        RawAgentResponse::Empty => Vec::new(),
    }
}

/// Coerce a JSON value to its display text
///
/// Strings pass through verbatim; numbers and booleans use their JSON text;
/// anything nested (a second level of array or object) is kept as its compact
/// JSON representation rather than flattened further.
fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
