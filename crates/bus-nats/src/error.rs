use crewline_bus::TransportError;
use thiserror::Error;

/// Error type for NATS transport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No connection string was configured.
    #[error("no NATS url configured")]
    Unconfigured,

    /// Failed to connect to the broker.
    #[error("failed to connect: {0}")]
    Connect(async_nats::ConnectErrorKind),

    /// Failed to publish.
    #[error("failed to publish: {0}")]
    Publish(async_nats::client::PublishErrorKind),

    /// Failed to subscribe.
    #[error("failed to subscribe: {0}")]
    Subscribe(#[from] async_nats::client::SubscribeError),
}

impl TransportError for Error {}
