//! NATS implementation of the bus transport.
//!
//! The broker is named by a single connection string (`NATS_URL`). A missing
//! value is not an error: every component built on an unconfigured connector
//! degrades to a no-op so each process can run standalone.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod subscription;

pub use error::Error;
pub use subscription::NatsSubscription;

use async_trait::async_trait;
use bytes::Bytes;
use crewline_bus::{BusTransport, Connect, MessageHandler};
use futures::StreamExt;
use tokio::sync::watch;

/// Environment variable naming the broker.
pub const NATS_URL_VAR: &str = "NATS_URL";

/// Connector producing NATS-backed transport handles.
#[derive(Clone, Debug)]
pub struct NatsConnector {
    url: Option<String>,
}

impl NatsConnector {
    /// Creates a connector for the given url, or an unconfigured one.
    #[must_use]
    pub const fn new(url: Option<String>) -> Self {
        Self { url }
    }

    /// Creates a connector from the `NATS_URL` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: std::env::var(NATS_URL_VAR).ok(),
        }
    }
}

#[async_trait]
impl Connect for NatsConnector {
    type Transport = NatsBus;

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn connect(&self) -> Result<NatsBus, Error> {
        let url = self.url.as_deref().ok_or(Error::Unconfigured)?;
        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Connect(e.kind()))?;
        Ok(NatsBus { client })
    }
}

/// A NATS-backed transport handle.
#[derive(Clone, Debug)]
pub struct NatsBus {
    client: async_nats::Client,
}

#[async_trait]
impl BusTransport for NatsBus {
    type Error = Error;

    type Subscription = NatsSubscription;

    async fn publish(&self, channel: &str, payload: Bytes) -> Result<(), Error> {
        self.client
            .publish(channel.to_owned(), payload)
            .await
            .map_err(|e| Error::Publish(e.kind()))
    }

    async fn subscribe<X>(
        &self,
        channels: &[String],
        handler: X,
    ) -> Result<NatsSubscription, Error>
    where
        X: MessageHandler,
    {
        let mut subscribers = Vec::with_capacity(channels.len());
        for channel in channels {
            let subscriber = self
                .client
                .subscribe(channel.clone())
                .await
                .map_err(Error::Subscribe)?;
            subscribers.push(subscriber);
        }
        let mut merged = futures::stream::select_all(subscribers);

        let (stop_sender, mut stop_receiver) = watch::channel(());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_receiver.changed() => break,
                    message = merged.next() => match message {
                        Some(message) => {
                            handler
                                .handle(message.subject.as_str(), message.payload)
                                .await;
                        }
                        None => break,
                    }
                }
            }
        });

        Ok(NatsSubscription { stop_sender })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    use crewline_bus::{
        Correlator, DispatcherBuilder, EventHandler, EventPublisher, EventSubscriber,
        HandlerError, RequestOutcome,
    };
    use crewline_events::{CHANNELS, UserLinked, VerifyGuildRequest};

    #[derive(Clone, Debug)]
    struct DropHandler;

    #[async_trait]
    impl EventHandler<UserLinked> for DropHandler {
        async fn handle(&self, _event: UserLinked) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    // These tests exercise the unconfigured degraded mode only; round-trip
    // coverage against a live broker lives with deployment smoke tests.

    #[tokio::test]
    async fn unconfigured_publish_is_a_silent_noop() {
        let publisher = EventPublisher::new(NatsConnector::new(None));
        publisher
            .publish(&UserLinked {
                user_id: "u1".to_owned(),
                tenant_id: "t1".to_owned(),
                discord_user_id: "d1".to_owned(),
                discord_username: "x".to_owned(),
            })
            .await;
    }

    #[tokio::test]
    async fn unconfigured_subscriber_never_starts() {
        let dispatcher = DispatcherBuilder::new()
            .with::<UserLinked, _>(DropHandler)
            .build(CHANNELS)
            .unwrap();
        let subscription = EventSubscriber::new(NatsConnector::new(None))
            .start(dispatcher)
            .await;
        assert!(subscription.is_none());
    }

    #[tokio::test]
    async fn unconfigured_request_times_out_immediately() {
        let correlator = Correlator::new(NatsConnector::new(None));

        let started = Instant::now();
        let outcome = correlator
            .request(&VerifyGuildRequest::new("g1"), Duration::from_secs(5))
            .await;

        assert!(matches!(outcome, RequestOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
