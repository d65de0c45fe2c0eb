use crewline_bus::TransportError;
use thiserror::Error;

/// Errors for the in-memory transport.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The connector was built without a broker.
    #[error("no in-memory broker configured")]
    Unconfigured,
}

impl TransportError for Error {}
