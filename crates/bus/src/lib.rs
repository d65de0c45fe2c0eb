//! Abstract interface for the cross-process broadcast event bus.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Catalog traits binding channel names to payload shapes.
pub mod catalog;

/// Correlators layer request/reply on top of pure broadcast.
pub mod correlator;

/// Dispatchers route inbound messages to per-channel handlers.
pub mod dispatcher;

/// Publishers own the shared outbound connection.
pub mod publisher;

/// Subscribers own the long-lived inbound connection.
pub mod subscriber;

/// Transport seams implemented per pub/sub backend.
pub mod transport;

pub use catalog::{CatalogMessage, CorrelatedRequest};
pub use correlator::{Correlator, DEFAULT_REQUEST_TIMEOUT, RequestOutcome};
pub use dispatcher::{Dispatcher, DispatcherBuilder, EventHandler, HandlerError, RegistryError};
pub use publisher::EventPublisher;
pub use subscriber::EventSubscriber;
pub use transport::{BusTransport, Connect, MessageHandler, Subscription, TransportError};
