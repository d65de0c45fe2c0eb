//! Realtime fan-out layer: pushes bus events to connected clients.
//!
//! Each client connection is authenticated once at connect time, joined to
//! its tenant and user rooms, and may request project rooms through an
//! authorized join. Room membership is local to an instance; emits are
//! bridged across instances over the bus's `gateway-relay` channel, so an
//! emit issued anywhere reaches members connected everywhere.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod relay;
mod socket;

/// Authentication and authorization collaborator seams.
pub mod auth;

/// Client-facing wire protocol frames.
pub mod protocol;

/// Room keys and local membership.
pub mod rooms;

pub use auth::{AuthError, Authenticator, ConnectionIdentity, Credential, ResourceAuthorizer};
pub use error::Error;
pub use protocol::{ClientCommand, ServerMessage};
pub use rooms::{Room, RoomRegistry};

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use crewline_bus::{BusTransport, Connect, EventPublisher, EventSubscriber, Subscription as _};
use crewline_events::RelayEvent;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;
use uuid::Uuid;

use crate::relay::relay_dispatcher;

/// Everything the per-connection handlers need, cheap to clone.
#[derive(Clone)]
pub(crate) struct GatewayState<C>
where
    C: Connect,
{
    pub(crate) instance_id: Uuid,
    pub(crate) rooms: RoomRegistry,
    pub(crate) publisher: EventPublisher<C>,
    pub(crate) authenticator: Arc<dyn Authenticator>,
    pub(crate) authorizer: Arc<dyn ResourceAuthorizer>,
}

impl<C> GatewayState<C>
where
    C: Connect,
{
    /// Delivers to local members, then republishes on the relay channel so
    /// every other instance can deliver to its own members.
    pub(crate) async fn emit_to_room(&self, room: &Room, event: &str, payload: serde_json::Value) {
        self.rooms.emit(room.as_str(), event, &payload);
        self.publisher
            .publish(&RelayEvent {
                origin: self.instance_id,
                room: room.as_str().to_owned(),
                event: event.to_owned(),
                payload,
            })
            .await;
    }
}

/// Configuration for a [`Gateway`].
pub struct GatewayOptions<C>
where
    C: Connect,
{
    /// Address the WebSocket server listens on.
    pub listen_addr: SocketAddr,

    /// Bus connector; unconfigured disables cross-instance room sharing.
    pub connector: C,

    /// Resolves handshake credentials to connection identities.
    pub authenticator: Arc<dyn Authenticator>,

    /// Authorizes project room joins.
    pub authorizer: Arc<dyn ResourceAuthorizer>,
}

/// The realtime push server.
pub struct Gateway<C>
where
    C: Connect,
{
    state: GatewayState<C>,
    connector: C,
    listen_addr: SocketAddr,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
    relay_subscription: Mutex<Option<<C::Transport as BusTransport>::Subscription>>,
}

impl<C> Gateway<C>
where
    C: Connect,
{
    /// Creates a new gateway instance.
    #[must_use]
    pub fn new(options: GatewayOptions<C>) -> Self {
        let state = GatewayState {
            instance_id: Uuid::new_v4(),
            rooms: RoomRegistry::new(),
            publisher: EventPublisher::new(options.connector.clone()),
            authenticator: options.authenticator,
            authorizer: options.authorizer,
        };

        Self {
            state,
            connector: options.connector,
            listen_addr: options.listen_addr,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
            relay_subscription: Mutex::new(None),
        }
    }

    /// Starts the relay subscription and the WebSocket server.
    ///
    /// # Errors
    ///
    /// Returns an error if already started, if the relay handler table is
    /// misconfigured, or if the listen address cannot be bound. A missing
    /// bus configuration is not an error: the server runs with local-only
    /// room delivery.
    pub async fn start(&self) -> Result<JoinHandle<()>, Error> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let dispatcher = relay_dispatcher(self.state.instance_id, self.state.rooms.clone())?;
        let subscription = EventSubscriber::new(self.connector.clone())
            .start(dispatcher)
            .await;
        *self.relay_subscription.lock() = subscription;

        let router = Router::new()
            .route("/ws", get(socket::ws_handler::<C>))
            .with_state(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;

        let shutdown_token = self.shutdown_token.clone();
        let handle = self.task_tracker.spawn(async move {
            tokio::select! {
                e = axum::serve(listener, router.into_make_service()).into_future() => {
                    info!("gateway server exited {:?}", e);
                }
                () = shutdown_token.cancelled() => {}
            }
        });

        self.task_tracker.close();

        Ok(handle)
    }

    /// Pushes an event to every member of a room, on every instance.
    pub async fn emit_to_room(&self, room: &Room, event: &str, payload: serde_json::Value) {
        self.state.emit_to_room(room, event, payload).await;
    }

    /// Stops the server and releases the relay subscription.
    pub async fn shutdown(&self) {
        info!("gateway shutting down");

        let subscription = self.relay_subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.shutdown().await;
        }

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("gateway shutdown");
    }

    /// Waits for the server task to exit.
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}
