//! Room lifecycle events published on the in-process event bus.

use serde_json::Value;

use crate::types::RoomId;

/// Topic names for room lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EventName {
    /// A room was created.
    RoomCreate,
    /// One or more rooms were deleted (explicitly or by the expiry sweep).
    RoomDelete,
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomCreate => write!(f, "RoomCreate"),
            Self::RoomDelete => write!(f, "RoomDelete"),
        }
    }
}

/// An event delivered to bus subscribers.
///
/// The payload is JSON so transport bridges (e.g. SSE) can forward it
/// without knowing the concrete shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Topic this event belongs to.
    pub name: EventName,
    /// JSON payload.
    pub data: Value,
}

impl Event {
    /// Event published when a room is created.
    pub fn room_create(room_id: RoomId) -> Self {
        Self {
            name: EventName::RoomCreate,
            data: Value::String(room_id.to_string()),
        }
    }

    /// Event published when rooms are deleted.
    pub fn room_delete(room_ids: &[RoomId]) -> Self {
        Self {
            name: EventName::RoomDelete,
            data: Value::Array(
                room_ids
                    .iter()
                    .map(|id| Value::String(id.to_string()))
                    .collect(),
            ),
        }
    }
}
