//! In-process implementation of the bus transport.
//!
//! Backed by one `tokio::sync::broadcast` sender per channel. Each
//! [`MemoryConnector`] owns an isolated broker, so processes (and tests)
//! sharing a connector see each other's messages and nothing else.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod subscription;

pub use error::Error;
pub use subscription::MemorySubscription;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use crewline_bus::{BusTransport, Connect, MessageHandler};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 128;

#[derive(Clone, Debug, Default)]
struct MemoryBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Bytes>>>>,
}

impl MemoryBroker {
    fn sender(&self, channel: &str) -> broadcast::Sender<Bytes> {
        self.channels
            .lock()
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// Connector producing handles onto one shared in-process broker.
#[derive(Clone, Debug)]
pub struct MemoryConnector {
    broker: MemoryBroker,
    configured: bool,
}

impl MemoryConnector {
    /// Creates a connector with a fresh broker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            broker: MemoryBroker::default(),
            configured: true,
        }
    }

    /// Creates a connector that behaves as if no broker were configured.
    ///
    /// Everything built on it degrades to a no-op; useful for exercising
    /// standalone-mode behavior.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            broker: MemoryBroker::default(),
            configured: false,
        }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connect for MemoryConnector {
    type Transport = MemoryBus;

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn connect(&self) -> Result<MemoryBus, Error> {
        if !self.configured {
            return Err(Error::Unconfigured);
        }
        Ok(MemoryBus {
            broker: self.broker.clone(),
        })
    }
}

/// A handle onto the in-process broker.
#[derive(Clone, Debug)]
pub struct MemoryBus {
    broker: MemoryBroker,
}

#[async_trait]
impl BusTransport for MemoryBus {
    type Error = Error;

    type Subscription = MemorySubscription;

    async fn publish(&self, channel: &str, payload: Bytes) -> Result<(), Error> {
        // A send error only means nobody is subscribed right now; with
        // at-most-once delivery that is an ordinary drop.
        let _ = self.broker.sender(channel).send(payload);
        Ok(())
    }

    async fn subscribe<X>(
        &self,
        channels: &[String],
        handler: X,
    ) -> Result<MemorySubscription, Error>
    where
        X: MessageHandler,
    {
        let streams: Vec<_> = channels
            .iter()
            .map(|channel| {
                let receiver = self.broker.sender(channel).subscribe();
                let channel = channel.clone();
                BroadcastStream::new(receiver).map(move |item| (channel.clone(), item))
            })
            .collect();
        let mut merged = futures::stream::select_all(streams);

        let (stop_sender, mut stop_receiver) = watch::channel(());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_receiver.changed() => break,
                    next = merged.next() => match next {
                        Some((channel, Ok(payload))) => {
                            handler.handle(&channel, payload).await;
                        }
                        Some((channel, Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                            warn!(%channel, missed, "subscriber lagged; messages dropped");
                        }
                        None => break,
                    }
                }
            }
        });

        Ok(MemorySubscription { stop_sender })
    }
}
