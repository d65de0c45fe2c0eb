use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for transport errors.
pub trait TransportError: Error + Send + Sync + 'static {}

/// Callback invoked for each inbound message on a subscription.
///
/// Implementations must contain their own failures; the transport loop
/// treats `handle` as infallible so one bad message cannot tear down the
/// subscription or any other in-flight message.
#[async_trait]
pub trait MessageHandler: Clone + Send + Sync + 'static {
    /// Handle a single raw message received on `channel`.
    async fn handle(&self, channel: &str, payload: Bytes);
}

/// A live subscription on the transport.
#[async_trait]
pub trait Subscription: Clone + Debug + Send + Sync + 'static {
    /// Stop the subscription loop and release the underlying resources.
    async fn shutdown(&self);
}

/// A connected handle to the pub/sub transport, cheap to clone.
#[async_trait]
pub trait BusTransport: Clone + Debug + Send + Sync + 'static {
    /// The error type for the transport.
    type Error: TransportError;

    /// The type of subscription opened by `subscribe`.
    type Subscription: Subscription;

    /// Broadcast a raw payload on a channel.
    async fn publish(&self, channel: &str, payload: Bytes) -> Result<(), Self::Error>;

    /// Subscribe to a fixed set of channels, routing every message through
    /// `handler`. Messages on the same channel arrive in publish order.
    async fn subscribe<X>(
        &self,
        channels: &[String],
        handler: X,
    ) -> Result<Self::Subscription, Self::Error>
    where
        X: MessageHandler;
}

/// Factory for transport connections.
///
/// A connector may be unconfigured (no broker named in the environment), in
/// which case everything built on it degrades to a no-op instead of failing.
#[async_trait]
pub trait Connect: Clone + Debug + Send + Sync + 'static {
    /// The transport produced by this connector.
    type Transport: BusTransport;

    /// Whether a broker is configured at all.
    fn is_configured(&self) -> bool;

    /// Open a new connection to the broker.
    async fn connect(&self) -> Result<Self::Transport, <Self::Transport as BusTransport>::Error>;
}
