use crewline_bus::RegistryError;
use thiserror::Error;

/// Error type for gateway lifecycle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The server was already started.
    #[error("already started")]
    AlreadyStarted,

    /// Failed to bind the listen address.
    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),

    /// The relay handler table disagrees with the event catalog.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
