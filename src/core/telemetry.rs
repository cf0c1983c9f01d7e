use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Full filter override, e.g. `GRADEBOOK_LOG=gradebook=trace,sqlx=info`.
const LOG_FILTER_ENV: &str = "GRADEBOOK_LOG";

/// The configured level applies to this crate; sqlx and everything else stay at `warn`.
pub(crate) fn default_directives(level: &str) -> String {
    format!("warn,sqlx=warn,gradebook={level}")
}

fn build_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&settings.telemetry().log_level)))
}

/// Installs the global subscriber: flattened JSON lines or compact text.
pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let builder = fmt().with_env_filter(build_filter(settings));

    let installed = if settings.telemetry().json {
        builder.json().flatten_event(true).with_current_span(false).try_init()
    } else {
        builder.compact().with_target(false).try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::debug!(
        environment = settings.runtime().environment.as_str(),
        json = settings.telemetry().json,
        "Tracing initialised"
    );

    Ok(())
}
