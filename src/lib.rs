pub mod core;
pub mod db;
pub mod domain;
pub mod errors;
pub(crate) mod repositories;
pub mod schemas;
pub mod services;

#[cfg(test)]
mod test_support;

pub use crate::core::config::Settings;
pub use crate::core::metrics::render as render_metrics;
pub use crate::core::state::AppState;
pub use crate::errors::{AttemptDenial, GradebookError, GradebookResult};

use crate::core::telemetry;

/// Loads settings, installs tracing and metrics, connects to Postgres and applies migrations.
pub async fn bootstrap() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!(
        environment = %settings.runtime().environment.as_str(),
        max_connections = settings.database().max_connections,
        "Gradebook ready"
    );

    Ok(AppState::new(settings, db_pool))
}
