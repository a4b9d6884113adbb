//! JSON serialization for WebSocket frames.

use super::types::{ClientEvent, ServerEvent};

/// Serialize an outbound event to a text frame.
pub fn serialize_outbound(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Deserialize an inbound text frame.
pub fn deserialize_inbound(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str(text)
}
