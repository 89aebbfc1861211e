//! Observability for Tessera: structured logging and Prometheus metrics.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output and an
//!   `EnvFilter` that honors `RUST_LOG`
//! - **Metrics**: the `metrics` facade backed by the Prometheus exporter
//!
//! ```text
//! # HELP tessera_requests_total Total number of dispatched requests
//! # TYPE tessera_requests_total counter
//! tessera_requests_total{plugin="",app="admin",status="200"} 1234
//! tessera_requests_total{plugin="shop",app="api",status="404"} 56
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{fields, init_logging, LogConfig};
pub use self::metrics::{init_metrics, record_request, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)
}
