use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

/// The error type external auth collaborators may surface.
pub type AuthError = Box<dyn std::error::Error + Send + Sync>;

/// Identity resolved once at connect time and attached immutably to the
/// connection for its lifetime. Opaque to the gateway beyond room derivation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionIdentity {
    /// The tenant the connection belongs to.
    pub tenant_id: String,

    /// The authenticated user.
    pub user_id: String,

    /// Pre-resolved role, passed through to authorization checks.
    pub role: String,
}

/// An opaque handshake credential.
///
/// App-native clients present a bearer token; web clients present a session
/// artifact. The gateway does not care which.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(String),

    /// A session cookie or header value.
    Session(String),
}

/// External collaborator resolving credentials to identities.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Resolve a handshake credential.
    ///
    /// # Errors
    ///
    /// Any error rejects the connection outright; no partial state is
    /// created.
    async fn authenticate(&self, credential: &Credential) -> Result<ConnectionIdentity, AuthError>;
}

/// External collaborator authorizing per-resource room joins.
#[async_trait]
pub trait ResourceAuthorizer: Send + Sync + 'static {
    /// Whether `identity` may join the room for `project_id`.
    ///
    /// # Errors
    ///
    /// Errors are treated as a refusal; the join fails explicitly.
    async fn can_access_project(
        &self,
        identity: &ConnectionIdentity,
        project_id: &str,
    ) -> Result<bool, AuthError>;
}

/// Pulls a credential out of the connection handshake.
pub(crate) fn extract_credential(headers: &HeaderMap) -> Option<Credential> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(Credential::Bearer(token.to_owned()));
        }
    }

    if let Some(value) = headers.get("x-session-token").and_then(|v| v.to_str().ok()) {
        return Some(Credential::Session(value.to_owned()));
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|cookie| cookie.strip_prefix("session="))
        })
        .map(|value| Credential::Session(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_wins_over_session_artifacts() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-1"),
        );
        headers.insert("x-session-token", HeaderValue::from_static("sess-1"));

        assert_eq!(
            extract_credential(&headers),
            Some(Credential::Bearer("tok-1".to_owned()))
        );
    }

    #[test]
    fn session_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-session-token", HeaderValue::from_static("sess-1"));

        assert_eq!(
            extract_credential(&headers),
            Some(Credential::Session("sess-1".to_owned()))
        );
    }

    #[test]
    fn session_cookie_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=sess-2; lang=en"),
        );

        assert_eq!(
            extract_credential(&headers),
            Some(Credential::Session("sess-2".to_owned()))
        );
    }

    #[test]
    fn missing_credentials_yield_none() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);
    }
}
