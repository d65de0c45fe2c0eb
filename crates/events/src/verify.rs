use crewline_bus::{CatalogMessage, CorrelatedRequest, RequestOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the [`crate::VERIFY_GUILD`] request channel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyGuildRequest {
    /// Caller-generated correlation id, unique per pending request.
    pub request_id: Uuid,

    /// The guild to verify.
    pub guild_id: String,
}

impl VerifyGuildRequest {
    /// Creates a request with a fresh correlation id.
    #[must_use]
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            guild_id: guild_id.into(),
        }
    }
}

impl CatalogMessage for VerifyGuildRequest {
    const CHANNEL: &'static str = crate::VERIFY_GUILD;
}

impl CorrelatedRequest for VerifyGuildRequest {
    type Response = VerifyResponse;

    fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn response_id(response: &VerifyResponse) -> Uuid {
        response.request_id
    }
}

/// Payload of the [`crate::VERIFY_RESPONSE`] channel, shared by all pending
/// verification requests and matched by correlation id.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// The correlation id of the request being answered.
    pub request_id: Uuid,

    /// How verification went.
    pub status: VerifyStatus,
}

/// Resolution of a guild verification.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyStatus {
    /// The bot is present in the guild.
    GuildVerified,

    /// The bot could not confirm the guild.
    GuildUnverified,

    /// No responder answered within the window.
    Timeout,
}

impl CatalogMessage for VerifyResponse {
    const CHANNEL: &'static str = crate::VERIFY_RESPONSE;
}

impl From<RequestOutcome<VerifyResponse>> for VerifyStatus {
    fn from(outcome: RequestOutcome<VerifyResponse>) -> Self {
        match outcome {
            RequestOutcome::Replied(response) => response.status,
            RequestOutcome::TimedOut => Self::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_kebab_case_wire_values() {
        assert_eq!(
            serde_json::to_value(VerifyStatus::GuildVerified).unwrap(),
            serde_json::json!("guild-verified")
        );
        assert_eq!(
            serde_json::to_value(VerifyStatus::Timeout).unwrap(),
            serde_json::json!("timeout")
        );
    }

    #[test]
    fn request_ids_are_unique_per_request() {
        assert_ne!(
            VerifyGuildRequest::new("g1").request_id,
            VerifyGuildRequest::new("g1").request_id
        );
    }

    #[test]
    fn timed_out_outcome_maps_to_timeout_status() {
        let outcome: RequestOutcome<VerifyResponse> = RequestOutcome::TimedOut;
        assert_eq!(VerifyStatus::from(outcome), VerifyStatus::Timeout);
    }
}
