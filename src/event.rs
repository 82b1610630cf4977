//! Messages from the renderer to the host.
//!
//! Events are JSON objects tagged by a `msg_type` key. Unknown tags and
//! malformed payloads are dropped rather than reported, so a newer renderer
//! can talk to an older host.

use serde_json::Value;

use crate::field::NodeId;

/// An event reported by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Neighbours of the node the user clicked, empty when the click hit
    /// the background.
    AdjacentNodeIds(Vec<NodeId>),
}

impl Event {
    /// Tag of [`Event::AdjacentNodeIds`].
    pub const ADJACENT_NODE_IDS: &'static str = "adjacent_node_ids";

    /// Parses an event message. Returns `None` for a missing or unknown
    /// `msg_type` and for payloads that do not match the tag.
    pub fn parse(message: &Value) -> Option<Self> {
        let Some(tag) = message.get("msg_type").and_then(Value::as_str) else {
            tracing::debug!("ignoring frontend message without msg_type");
            return None;
        };

        match tag {
            Self::ADJACENT_NODE_IDS => {
                let ids = message
                    .get("adjacentNodeIds")
                    .and_then(|v| serde_json::from_value(v.clone()).ok());
                if ids.is_none() {
                    tracing::debug!(msg_type = tag, "ignoring malformed event payload");
                }
                ids.map(Self::AdjacentNodeIds)
            }
            other => {
                tracing::debug!(msg_type = other, "ignoring unknown event");
                None
            }
        }
    }

    /// Wire tag of the event.
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::AdjacentNodeIds(_) => Self::ADJACENT_NODE_IDS,
        }
    }
}
