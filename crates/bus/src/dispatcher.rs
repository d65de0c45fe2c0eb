use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{error, warn};

use crate::catalog::CatalogMessage;
use crate::transport::MessageHandler;

/// The error type handlers may surface to the dispatch boundary.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A business handler for one catalog channel.
///
/// Handlers should tolerate replays: delivery is at-most-once, but external
/// state may be replayed across process restarts.
#[async_trait]
pub trait EventHandler<M>: Send + Sync + 'static
where
    M: CatalogMessage,
{
    /// Handle one decoded event.
    ///
    /// # Errors
    ///
    /// Errors are caught, logged with the channel name, and never stop the
    /// subscription loop or subsequent messages.
    async fn handle(&self, event: M) -> Result<(), HandlerError>;
}

enum DispatchError {
    Malformed(serde_json::Error),
    Handler(HandlerError),
}

type ErasedHandler =
    Arc<dyn Fn(Bytes) -> BoxFuture<'static, Result<(), DispatchError>> + Send + Sync>;

/// An error raised when the handler table disagrees with the event catalog.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same channel was registered twice.
    #[error("channel `{0}` has two registered handlers")]
    DuplicateChannel(String),

    /// A handler was registered for a channel the catalog does not name.
    #[error("channel `{0}` is not in the event catalog")]
    UnknownChannel(String),
}

/// Builder for a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: Vec<(&'static str, ErasedHandler)>,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a catalog message type.
    #[must_use]
    pub fn with<M, H>(mut self, handler: H) -> Self
    where
        M: CatalogMessage,
        H: EventHandler<M>,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |payload: Bytes| {
            let handler = Arc::clone(&handler);
            let fut: BoxFuture<'static, Result<(), DispatchError>> = Box::pin(async move {
                let event: M =
                    serde_json::from_slice(&payload).map_err(DispatchError::Malformed)?;
                handler.handle(event).await.map_err(DispatchError::Handler)
            });
            fut
        });
        self.handlers.push((M::CHANNEL, erased));
        self
    }

    /// Validates the handler table against the catalog and builds the
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if a channel is registered twice or is
    /// missing from `catalog`. Misregistration is a configuration bug best
    /// caught at startup, not a runtime condition to paper over.
    pub fn build(self, catalog: &[&str]) -> Result<Dispatcher, RegistryError> {
        let mut handlers = HashMap::with_capacity(self.handlers.len());
        for (channel, handler) in self.handlers {
            if !catalog.contains(&channel) {
                return Err(RegistryError::UnknownChannel(channel.to_owned()));
            }
            if handlers.insert(channel, handler).is_some() {
                return Err(RegistryError::DuplicateChannel(channel.to_owned()));
            }
        }
        Ok(Dispatcher {
            handlers: Arc::new(handlers),
        })
    }
}

/// Routes inbound messages to the registered handler for their channel.
///
/// Every failure mode is contained per message: malformed JSON, unknown
/// channels, and handler errors are logged and dropped without disturbing
/// the subscription loop.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HashMap<&'static str, ErasedHandler>>,
}

impl Dispatcher {
    /// The fixed channel set this dispatcher subscribes to.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.handlers.keys().map(|c| (*c).to_owned()).collect();
        channels.sort_unstable();
        channels
    }
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.channels())
            .finish()
    }
}

#[async_trait]
impl MessageHandler for Dispatcher {
    async fn handle(&self, channel: &str, payload: Bytes) {
        let Some(handler) = self.handlers.get(channel) else {
            warn!(%channel, "message on unknown channel dropped");
            return;
        };

        match handler(payload).await {
            Ok(()) => {}
            Err(DispatchError::Malformed(err)) => {
                warn!(%channel, error = %err, "malformed message dropped");
            }
            Err(DispatchError::Handler(err)) => {
                error!(%channel, error = %err, "event handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    struct Ping;

    impl CatalogMessage for Ping {
        const CHANNEL: &'static str = "ping";
    }

    #[derive(Clone, Debug)]
    struct NoopHandler;

    #[async_trait]
    impl EventHandler<Ping> for NoopHandler {
        async fn handle(&self, _event: Ping) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn build_rejects_channels_missing_from_the_catalog() {
        let result = DispatcherBuilder::new()
            .with::<Ping, _>(NoopHandler)
            .build(&["pong"]);
        assert!(matches!(
            result,
            Err(RegistryError::UnknownChannel(channel)) if channel == "ping"
        ));
    }

    #[test]
    fn build_rejects_a_channel_registered_twice() {
        let result = DispatcherBuilder::new()
            .with::<Ping, _>(NoopHandler)
            .with::<Ping, _>(NoopHandler)
            .build(&["ping"]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateChannel(channel)) if channel == "ping"
        ));
    }

    #[test]
    fn build_accepts_a_catalog_superset() {
        let dispatcher = DispatcherBuilder::new()
            .with::<Ping, _>(NoopHandler)
            .build(&["ping", "pong"])
            .unwrap();
        assert_eq!(dispatcher.channels(), vec!["ping".to_owned()]);
    }
}
