//! Process-wide recorder for the `metrics` facade used by the HTTP middleware.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static RECORDER_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once. Later calls reuse the first handle.
pub fn install_recorder() -> Option<&'static PrometheusHandle> {
    if let Some(handle) = RECORDER_HANDLE.get() {
        return Some(handle);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(RECORDER_HANDLE.get_or_init(|| handle)),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            RECORDER_HANDLE.get()
        }
    }
}

/// Render everything recorded through the `metrics` facade.
pub fn render_recorder() -> String {
    RECORDER_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
