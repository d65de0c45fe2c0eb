use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::catalog::CatalogMessage;
use crate::transport::{BusTransport, Connect};

/// The shared outbound side of the bus.
///
/// The connection is established lazily on the first publish and reused by
/// every clone; concurrent first-time publishers await the same in-flight
/// connection attempt rather than opening their own. `publish` is
/// best-effort, at-most-once: transport failures are logged and swallowed,
/// never surfaced to the caller, and nothing is retried.
#[derive(Clone, Debug)]
pub struct EventPublisher<C>
where
    C: Connect,
{
    connector: C,
    transport: Arc<OnceCell<Option<C::Transport>>>,
}

impl<C> EventPublisher<C>
where
    C: Connect,
{
    /// Creates a new publisher over the given connector.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            transport: Arc::new(OnceCell::new()),
        }
    }

    /// Broadcast a catalog message on its channel.
    ///
    /// Callers observe success regardless of transport state. A failed or
    /// unconfigured transport means the message is silently dropped; that
    /// tradeoff is what keeps consumers free to assume at-most-once.
    pub async fn publish<M>(&self, message: &M)
    where
        M: CatalogMessage,
    {
        let Some(transport) = self.transport().await else {
            return;
        };

        let payload = match serde_json::to_vec(message) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                warn!(channel = M::CHANNEL, error = %err, "unserializable payload dropped");
                return;
            }
        };

        if let Err(err) = transport.publish(M::CHANNEL, payload).await {
            warn!(channel = M::CHANNEL, error = %err, "publish dropped");
        }
    }

    /// Returns the shared transport handle, connecting on first use.
    ///
    /// The result of the first attempt is cached either way: a process that
    /// could not reach the broker runs in degraded no-op mode from then on.
    async fn transport(&self) -> Option<&C::Transport> {
        self.transport
            .get_or_init(|| async {
                if !self.connector.is_configured() {
                    info!("bus transport not configured; outbound events disabled");
                    return None;
                }

                match self.connector.connect().await {
                    Ok(transport) => Some(transport),
                    Err(err) => {
                        warn!(error = %err, "bus connect failed; outbound events disabled");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}
