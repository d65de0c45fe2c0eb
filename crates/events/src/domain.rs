use crewline_bus::CatalogMessage;
use serde::{Deserialize, Serialize};

/// Payload of the [`crate::USER_LINKED`] channel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLinked {
    /// The linking user.
    pub user_id: String,

    /// The tenant the user belongs to.
    pub tenant_id: String,

    /// The linked chat-platform account id.
    pub discord_user_id: String,

    /// The linked chat-platform username at link time.
    pub discord_username: String,
}

impl CatalogMessage for UserLinked {
    const CHANNEL: &'static str = crate::USER_LINKED;
}

/// Payload of the [`crate::PROJECT_CREATED`] channel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    /// The new project.
    pub project_id: String,

    /// The tenant the project belongs to.
    pub tenant_id: String,

    /// Human-readable project name.
    pub name: String,
}

impl CatalogMessage for ProjectCreated {
    const CHANNEL: &'static str = crate::PROJECT_CREATED;
}

/// Payload of the [`crate::TASK_ASSIGNED`] channel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssigned {
    /// The assigned task.
    pub task_id: String,

    /// The project the task belongs to.
    pub project_id: String,

    /// The tenant the project belongs to.
    pub tenant_id: String,

    /// The user the task was assigned to.
    pub assignee_user_id: String,

    /// Task title, for notification rendering.
    pub title: String,
}

impl CatalogMessage for TaskAssigned {
    const CHANNEL: &'static str = crate::TASK_ASSIGNED;
}
