use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::transport::{BusTransport, Connect};

/// The long-lived inbound side of the bus.
///
/// A process creates one subscriber at startup, hands it the dispatcher for
/// its fixed channel set, and keeps the returned subscription for the life
/// of the process.
#[derive(Clone, Debug)]
pub struct EventSubscriber<C>
where
    C: Connect,
{
    connector: C,
}

impl<C> EventSubscriber<C>
where
    C: Connect,
{
    /// Creates a new subscriber over the given connector.
    pub const fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Opens the inbound connection and subscribes the dispatcher's channel
    /// set.
    ///
    /// Returns `None` when no broker is configured or reachable: the process
    /// keeps running standalone and simply never receives events.
    pub async fn start(
        &self,
        dispatcher: Dispatcher,
    ) -> Option<<C::Transport as BusTransport>::Subscription> {
        if !self.connector.is_configured() {
            info!("bus transport not configured; inbound events disabled");
            return None;
        }

        let transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(error = %err, "bus connect failed; inbound events disabled");
                return None;
            }
        };

        let channels = dispatcher.channels();
        match transport.subscribe(&channels, dispatcher).await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!(error = %err, "bus subscribe failed; inbound events disabled");
                None
            }
        }
    }
}
