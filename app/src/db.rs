// bazaar/app/src/db.rs
use crate::config::AppConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Opens the shared connection pool. Purchase transactions hold a connection
/// for their whole duration, so `acquire_timeout` bounds how long a buy waits
/// for one under load.
pub async fn connect_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .min_connections(config.db_min_connections)
    .max_lifetime(config.db_max_lifetime)
    .idle_timeout(config.db_idle_timeout)
    .acquire_timeout(config.db_acquire_timeout)
    .test_before_acquire(true)
    .connect(&config.database_url)
    .await?;
  tracing::info!(
    max_connections = config.db_max_connections,
    min_connections = config.db_min_connections,
    "Database pool ready."
  );
  Ok(pool)
}
