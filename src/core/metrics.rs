use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const ATTEMPTS_TOTAL: &str = "gradebook_attempts_total";
pub(crate) const IMPORTS_TOTAL: &str = "gradebook_imports_total";
pub(crate) const ESSAY_GRADES_TOTAL: &str = "gradebook_essay_grades_total";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Prometheus exposition text for a scrape endpoint; `None` unless `PROMETHEUS_ENABLED` was set
/// when [`crate::bootstrap`] ran.
pub fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_attempt_event(event: &'static str) {
    metrics::counter!(ATTEMPTS_TOTAL, "event" => event).increment(1);
}

pub(crate) fn record_import(result: &'static str) {
    metrics::counter!(IMPORTS_TOTAL, "result" => result).increment(1);
}

pub(crate) fn record_essay_grades() {
    metrics::counter!(ESSAY_GRADES_TOTAL).increment(1);
}
