//! Prometheus metrics for Tessera.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `tessera_requests_total` | Counter | `plugin`, `app`, `status` |
//! | `tessera_request_duration_seconds` | Histogram | `plugin`, `app` |
//!
//! Recording before [`init_metrics`] is a no-op.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "tessera_requests_total";

/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "tessera_request_duration_seconds";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are recorded.
    pub enabled: bool,

    /// Address of the scrape listener. Empty disables the listener; metrics
    /// stay available through [`render_metrics`].
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder.
///
/// With a non-empty `addr`, the scrape listener is spawned on the current
/// tokio runtime.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for a malformed address and
/// [`TelemetryError::MetricsInit`] if a recorder is already installed or no
/// runtime is available for the listener.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = if config.addr.is_empty() {
        PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
    } else {
        let addr: SocketAddr = config
            .addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(addr)
            .build()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        runtime.spawn(async move {
            if let Err(e) = exporter.await {
                tracing::error!(error = ?e, "metrics exporter stopped");
            }
        });
        handle
    };

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();
    tracing::debug!(addr = %config.addr, "metrics recorder installed");
    Ok(())
}

/// Renders all metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Dispatch duration in seconds, middleware included"
    );
}

/// Records a dispatched request.
///
/// The host application reports `plugin` and `app` as empty strings.
pub fn record_request(plugin: &str, app: &str, status: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "plugin" => plugin.to_string(),
        "app" => app.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "plugin" => plugin.to_string(),
        "app" => app.to_string()
    )
    .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-address".to_string(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_without_recorder() {
        record_request("", "admin", 200, Duration::from_millis(3));
        record_request("shop", "api", 500, Duration::from_millis(12));
    }
}
