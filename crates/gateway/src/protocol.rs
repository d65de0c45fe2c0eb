use serde::{Deserialize, Serialize};

/// A command sent by a connected client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    /// Request membership in a project room; answered with a `join-result`.
    #[serde(rename_all = "camelCase")]
    JoinProject {
        /// The project to join.
        project_id: String,
    },

    /// Leave a previously joined project room.
    #[serde(rename_all = "camelCase")]
    LeaveProject {
        /// The project to leave.
        project_id: String,
    },
}

/// A frame pushed to a connected client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A fan-out event for a room this connection is a member of.
    #[serde(rename_all = "camelCase")]
    Event {
        /// The room the event was emitted to.
        room: String,

        /// The client-facing event name.
        event: String,

        /// Opaque event payload.
        payload: serde_json::Value,
    },

    /// The explicit result of a `join-project` command.
    #[serde(rename_all = "camelCase")]
    JoinResult {
        /// The project that was asked for.
        project_id: String,

        /// Whether the join was authorized and applied.
        ok: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_project_command_wire_shape() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"type":"join-project","projectId":"p1"}"#).unwrap();
        assert_eq!(
            command,
            ClientCommand::JoinProject {
                project_id: "p1".to_owned()
            }
        );
    }

    #[test]
    fn event_frame_wire_shape() {
        let frame = ServerMessage::Event {
            room: "project:p1".to_owned(),
            event: "task-assigned".to_owned(),
            payload: serde_json::json!({"taskId": "k1"}),
        };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            serde_json::json!({
                "type": "event",
                "room": "project:p1",
                "event": "task-assigned",
                "payload": {"taskId": "k1"},
            })
        );
    }

    #[test]
    fn join_result_frame_wire_shape() {
        let frame = ServerMessage::JoinResult {
            project_id: "p1".to_owned(),
            ok: false,
        };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            serde_json::json!({"type": "join-result", "projectId": "p1", "ok": false})
        );
    }
}
