use crewline_bus::CatalogMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the [`crate::GATEWAY_RELAY`] channel.
///
/// Room membership is local to each gateway instance; an emit issued
/// anywhere is republished here so every instance can deliver to its own
/// local members. `origin` lets the emitting instance skip its own relay,
/// since it already delivered locally.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    /// The gateway instance that issued the emit.
    pub origin: Uuid,

    /// The target room key, e.g. `tenant:t1` or `project:p1`.
    pub room: String,

    /// The client-facing event name.
    pub event: String,

    /// Opaque event payload forwarded to room members as-is.
    pub payload: serde_json::Value,
}

impl CatalogMessage for RelayEvent {
    const CHANNEL: &'static str = crate::GATEWAY_RELAY;
}
