//! The event catalog: the closed set of bus channels and their payloads.
//!
//! Channel names and JSON field names are wire identifiers shared with
//! independently-deployed processes. Entries are append-only: renaming or
//! removing one is a breaking change across process boundaries.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Domain events emitted by the web backend and the chat bot.
pub mod domain;

/// The gateway's cross-instance fan-out bridge.
pub mod relay;

/// Guild verification request/reply over the bus.
pub mod verify;

pub use domain::{ProjectCreated, TaskAssigned, UserLinked};
pub use relay::RelayEvent;
pub use verify::{VerifyGuildRequest, VerifyResponse, VerifyStatus};

/// A user linked their chat-platform account.
pub const USER_LINKED: &str = "user-linked";

/// A project was created.
pub const PROJECT_CREATED: &str = "project-created";

/// A task was assigned to a user.
pub const TASK_ASSIGNED: &str = "task-assigned";

/// Correlated guild verification requests.
pub const VERIFY_GUILD: &str = "verify-guild";

/// Shared response channel for all pending guild verifications.
pub const VERIFY_RESPONSE: &str = "verify-response";

/// Internal channel bridging gateway instances; not for business events.
pub const GATEWAY_RELAY: &str = "gateway-relay";

/// Every channel in the catalog, exactly once.
///
/// Dispatchers are validated against this table at startup so a handler for
/// a channel nobody publishes is a detectable configuration error.
pub const CHANNELS: &[&str] = &[
    USER_LINKED,
    PROJECT_CREATED,
    TASK_ASSIGNED,
    VERIFY_GUILD,
    VERIFY_RESPONSE,
    GATEWAY_RELAY,
];

#[cfg(test)]
mod tests {
    use super::*;

    use crewline_bus::CatalogMessage;

    #[test]
    fn catalog_names_each_channel_once() {
        let mut seen = CHANNELS.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), CHANNELS.len());
    }

    #[test]
    fn payload_channels_appear_in_catalog() {
        for channel in [
            UserLinked::CHANNEL,
            ProjectCreated::CHANNEL,
            TaskAssigned::CHANNEL,
            VerifyGuildRequest::CHANNEL,
            VerifyResponse::CHANNEL,
            RelayEvent::CHANNEL,
        ] {
            assert!(CHANNELS.contains(&channel), "missing {channel}");
        }
    }
}
