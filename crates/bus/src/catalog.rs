use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// A payload type bound to exactly one catalog channel.
///
/// The channel name is part of the cross-process wire contract: it must
/// appear in the event catalog exactly once and never be renamed, since the
/// producing and consuming processes deploy independently.
pub trait CatalogMessage:
    Debug + DeserializeOwned + Serialize + Send + Sync + 'static
{
    /// The catalog channel this payload travels on.
    const CHANNEL: &'static str;
}

/// A catalog message that expects a correlated reply on a shared response
/// channel.
///
/// Many callers publish requests carrying distinct request ids and all
/// listen on the same response channel; matching is purely by id.
pub trait CorrelatedRequest: CatalogMessage {
    /// The response payload type, bound to the shared response channel.
    type Response: CatalogMessage;

    /// The caller-generated correlation id carried by this request.
    fn request_id(&self) -> Uuid;

    /// The correlation id carried by a response on the shared channel.
    fn response_id(response: &Self::Response) -> Uuid;
}
