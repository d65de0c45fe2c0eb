use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::{CatalogMessage, CorrelatedRequest};
use crate::publisher::EventPublisher;
use crate::transport::{BusTransport, Connect, MessageHandler, Subscription};

/// The default window a correlated request waits for its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How a correlated request resolved.
///
/// Timing out is an expected outcome, not an error; callers must branch on
/// it the same way they branch on a reply.
#[derive(Debug)]
pub enum RequestOutcome<R> {
    /// The matching response arrived within the window.
    Replied(R),

    /// No matching response arrived (or no transport is configured).
    TimedOut,
}

impl<R> RequestOutcome<R> {
    /// Whether the request timed out.
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// The reply, if one arrived.
    #[must_use]
    pub fn replied(self) -> Option<R> {
        match self {
            Self::Replied(reply) => Some(reply),
            Self::TimedOut => None,
        }
    }
}

/// Request/reply layered on top of pure broadcast.
///
/// Each call publishes a request carrying a fresh correlation id and opens a
/// dedicated short-lived subscription on the shared response channel,
/// resolving with the first response carrying the same id or with
/// [`RequestOutcome::TimedOut`] when the window elapses. Concurrent callers
/// share the response channel and rely solely on id filtering, so every
/// pending caller sees (and discards) every other caller's response — fine
/// at low request volumes, not a pattern to reuse for high-throughput
/// request/reply traffic.
#[derive(Clone, Debug)]
pub struct Correlator<C>
where
    C: Connect,
{
    connector: C,
    publisher: EventPublisher<C>,
}

impl<C> Correlator<C>
where
    C: Connect,
{
    /// Creates a new correlator over the given connector.
    pub fn new(connector: C) -> Self {
        Self {
            publisher: EventPublisher::new(connector.clone()),
            connector,
        }
    }

    /// Publish `request` and await its reply within
    /// [`DEFAULT_REQUEST_TIMEOUT`].
    pub async fn request_with_default<R>(&self, request: &R) -> RequestOutcome<R::Response>
    where
        R: CorrelatedRequest,
    {
        self.request(request, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Publish `request` and await its correlated reply.
    ///
    /// Resolves exactly once, from whichever of reply and timeout comes
    /// first; the dedicated subscription is released on both paths. With no
    /// transport configured the call resolves `TimedOut` immediately rather
    /// than sleeping out the window.
    pub async fn request<R>(
        &self,
        request: &R,
        timeout: Duration,
    ) -> RequestOutcome<R::Response>
    where
        R: CorrelatedRequest,
    {
        if !self.connector.is_configured() {
            return RequestOutcome::TimedOut;
        }

        // Dedicated per-request connection: isolation and trivial cleanup
        // are worth the connect overhead at these volumes.
        let transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(error = %err, "bus connect failed; request resolves as timed out");
                return RequestOutcome::TimedOut;
            }
        };

        let request_id = request.request_id();
        let (reply_sender, reply_receiver) = oneshot::channel();
        let handler = ReplyHandler::<R> {
            request_id,
            reply: Arc::new(Mutex::new(Some(reply_sender))),
            _marker: PhantomData,
        };

        let response_channel = R::Response::CHANNEL.to_owned();
        let subscription = match transport.subscribe(&[response_channel], handler).await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(error = %err, "response subscribe failed; request resolves as timed out");
                return RequestOutcome::TimedOut;
            }
        };

        self.publisher.publish(request).await;

        let outcome = match tokio::time::timeout(timeout, reply_receiver).await {
            Ok(Ok(response)) => RequestOutcome::Replied(response),
            // Timer fired, or the reply slot was dropped without a match.
            _ => RequestOutcome::TimedOut,
        };

        // Single cleanup path regardless of which side won the race.
        subscription.shutdown().await;

        outcome
    }
}

/// Watches the shared response channel for one correlation id.
struct ReplyHandler<R>
where
    R: CorrelatedRequest,
{
    request_id: Uuid,
    reply: Arc<Mutex<Option<oneshot::Sender<R::Response>>>>,
    _marker: PhantomData<R>,
}

impl<R> Clone for ReplyHandler<R>
where
    R: CorrelatedRequest,
{
    fn clone(&self) -> Self {
        Self {
            request_id: self.request_id,
            reply: Arc::clone(&self.reply),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R> MessageHandler for ReplyHandler<R>
where
    R: CorrelatedRequest,
{
    async fn handle(&self, channel: &str, payload: Bytes) {
        let response: R::Response = match serde_json::from_slice(&payload) {
            Ok(response) => response,
            Err(err) => {
                warn!(%channel, error = %err, "malformed response dropped");
                return;
            }
        };

        if R::response_id(&response) != self.request_id {
            // Another pending caller's reply on the shared channel.
            debug!(%channel, "unmatched response ignored");
            return;
        }

        // Taking the sender makes resolution single-shot even if a duplicate
        // matching response arrives.
        if let Some(sender) = self.reply.lock().take() {
            let _ = sender.send(response);
        }
    }
}
