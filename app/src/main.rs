// bazaar/app/src/main.rs

mod config;
mod db;
mod errors;
mod state;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use bazaar::PgMarketStore;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  // LOG_FORMAT=json switches to one JSON object per line for log shippers.
  let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();

  tracing::info!("Starting marketplace server...");

  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);

  let pool = db::connect_pool(&app_config)
    .await
    .context("Failed to connect to the database")?;
  let store = Arc::new(PgMarketStore::new(pool));

  if app_config.run_migrations {
    store.migrate().await.context("Failed to apply database migrations")?;
    tracing::info!("Database migrations applied.");
  }

  let app_state = AppState::new(store.clone(), store, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("Server terminated with an error")?;

  Ok(())
}
