// bazaar/app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  // Connection pool
  pub db_max_connections: u32,
  pub db_min_connections: u32,
  pub db_max_lifetime: Duration,
  pub db_idle_timeout: Duration,
  pub db_acquire_timeout: Duration,

  /// Apply the bundled schema on startup.
  pub run_migrations: bool,
  /// Upper bound on a single purchase, lock wait included.
  pub purchase_deadline: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // .env is optional
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process
  /// environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let or_default = |var_name: &str, default: &str| lookup(var_name).unwrap_or_else(|| default.to_string());

    let server_host = or_default("SERVER_HOST", "127.0.0.1");
    let server_port = parsed::<u16>("SERVER_PORT", &or_default("SERVER_PORT", "8080"))?;
    let database_url = get_env("DATABASE_URL")?;

    let db_max_connections = parsed::<u32>("DB_MAX_CONNECTIONS", &or_default("DB_MAX_CONNECTIONS", "15"))?;
    let db_min_connections = parsed::<u32>("DB_MIN_CONNECTIONS", &or_default("DB_MIN_CONNECTIONS", "5"))?;
    if db_max_connections == 0 || db_min_connections > db_max_connections {
      return Err(AppError::Config(format!(
        "DB_MIN_CONNECTIONS ({}) must not exceed DB_MAX_CONNECTIONS ({}), which must be positive",
        db_min_connections, db_max_connections
      )));
    }
    let db_max_lifetime = Duration::from_secs(parsed("DB_MAX_LIFETIME_SECS", &or_default("DB_MAX_LIFETIME_SECS", "3600"))?);
    let db_idle_timeout = Duration::from_secs(parsed("DB_IDLE_TIMEOUT_SECS", &or_default("DB_IDLE_TIMEOUT_SECS", "1800"))?);
    let db_acquire_timeout =
      Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", &or_default("DB_ACQUIRE_TIMEOUT_SECS", "5"))?);

    let run_migrations = parsed::<bool>("RUN_MIGRATIONS", &or_default("RUN_MIGRATIONS", "false"))?;
    let purchase_deadline_ms = parsed::<u64>("PURCHASE_DEADLINE_MS", &or_default("PURCHASE_DEADLINE_MS", "10000"))?;
    if purchase_deadline_ms == 0 {
      return Err(AppError::Config("PURCHASE_DEADLINE_MS must be positive".into()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      db_min_connections,
      db_max_lifetime,
      db_idle_timeout,
      db_acquire_timeout,
      run_migrations,
      purchase_deadline: Duration::from_millis(purchase_deadline_ms),
    })
  }
}

fn parsed<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
}
