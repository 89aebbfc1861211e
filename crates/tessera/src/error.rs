//! Startup errors.

use tessera_config::ConfigError;
use tessera_core::TesseraError;
use tessera_middleware::RegistryError;
use tessera_router::RouteError;
use tessera_server::ServerError;
use tessera_telemetry::TelemetryError;
use thiserror::Error;

/// Anything that stops an [`Application`](crate::Application) from
/// starting or serving.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The middleware configuration is malformed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The route table could not be built.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A bootstrap failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] TesseraError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}
