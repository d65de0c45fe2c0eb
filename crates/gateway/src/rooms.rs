use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::ServerMessage;

/// A fan-out group key.
///
/// Tenant and user rooms are joined unconditionally at connect time from the
/// authenticated identity; project rooms only after an authorized join.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Room(String);

impl Room {
    /// The room every connection of a tenant is in.
    #[must_use]
    pub fn tenant(tenant_id: &str) -> Self {
        Self(format!("tenant:{tenant_id}"))
    }

    /// The room every connection of a user is in.
    #[must_use]
    pub fn user(user_id: &str) -> Self {
        Self(format!("user:{user_id}"))
    }

    /// The room for a project's watchers.
    #[must_use]
    pub fn project(project_id: &str) -> Self {
        Self(format!("project:{project_id}"))
    }

    /// The wire form of the room key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership of local connections in rooms.
///
/// Local only: a connection lives on the instance it connected to, and
/// cross-instance delivery happens over the relay channel, not here.
#[derive(Clone, Debug, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, HashMap<Uuid, mpsc::Sender<ServerMessage>>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room.
    pub fn join(&self, room: &Room, connection_id: Uuid, sender: mpsc::Sender<ServerMessage>) {
        self.rooms
            .entry(room.as_str().to_owned())
            .or_default()
            .insert(connection_id, sender);
    }

    /// Removes a connection from a room.
    pub fn leave(&self, room: &Room, connection_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(room.as_str()) {
            members.remove(&connection_id);
        }
        self.rooms
            .remove_if(room.as_str(), |_, members| members.is_empty());
    }

    /// Delivers an event to every local member of a room.
    ///
    /// Returns the number of members delivered to. Members with a full
    /// outbound queue are skipped; at-most-once applies to client push too.
    pub fn emit(&self, room: &str, event: &str, payload: &serde_json::Value) -> usize {
        let Some(members) = self.rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, sender) in members.iter() {
            let frame = ServerMessage::Event {
                room: room.to_owned(),
                event: event.to_owned(),
                payload: payload.clone(),
            };
            if sender.try_send(frame).is_ok() {
                delivered += 1;
            } else {
                debug!(%connection_id, %room, "slow or closed connection skipped");
            }
        }
        delivered
    }

    /// The number of local members in a room.
    #[must_use]
    pub fn member_count(&self, room: &Room) -> usize {
        self.rooms
            .get(room.as_str())
            .map_or(0, |members| members.len())
    }
}
