// bazaar/app/src/state.rs
use crate::config::AppConfig;
use bazaar::store::{AccountDirectory, CatalogStore};
use bazaar::{CatalogService, PurchaseEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<CatalogService>,
  pub purchases: Arc<PurchaseEngine>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Wires both services onto the same store. Postgres in production, the
  /// in-memory store in tests.
  pub fn new(store: Arc<dyn CatalogStore>, accounts: Arc<dyn AccountDirectory>, config: Arc<AppConfig>) -> Self {
    Self {
      catalog: Arc::new(CatalogService::new(store.clone(), accounts.clone())),
      purchases: Arc::new(PurchaseEngine::new(store, accounts)),
      config,
    }
  }
}
