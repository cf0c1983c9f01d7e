pub(crate) mod fixtures;

use std::sync::{Arc, OnceLock};

use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::domain::Attempt;
use crate::services::attempts;

const TEST_DATABASE_ENV: &str = "GRADEBOOK_TEST_DATABASE_URL";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn test_settings() -> Settings {
    Settings::test_defaults("postgresql://localhost/gradebook_test")
}

fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var(TEST_DATABASE_ENV).ok().filter(|url| !url.trim().is_empty())
}

/// A fresh schema on the test database, or `None` when no test database is configured.
///
/// Holds the env lock for the lifetime of the context so database tests run one at a time.
pub(crate) async fn setup_test_context() -> Option<TestContext> {
    let guard = env_lock().await;
    let Some(database_url) = test_database_url() else {
        eprintln!("{TEST_DATABASE_ENV} is not set; skipping database test");
        return None;
    };

    let settings = Settings::test_defaults(&database_url);
    let db = prepare_db(&settings).await;

    Some(TestContext { state: AppState::new(settings, db), _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");
    reset_public_schema(&db).await.expect("reset schema");
    ensure_schema(&db).await.expect("schema");
    db
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir =
        std::env::var("GRADEBOOK_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir))
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    migrator.run(pool).await.map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    Ok(())
}

pub(crate) async fn create_student_attempt(
    state: &AppState,
    assignment_id: &str,
    user_id: &str,
) -> Attempt {
    attempts::start_or_resume(state, assignment_id, user_id).await.expect("start attempt")
}
