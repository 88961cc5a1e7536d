// bazaar/src/error.rs
use thiserror::Error;

use crate::workflow::WorkflowError;

/// Every failure the marketplace core can report.
///
/// `NotFound`, `InsufficientQuantity`, `DuplicateName`, `Unauthorized`,
/// `Forbidden` and `Validation` are expected outcomes that callers map to
/// distinct responses. `Database`, `Workflow` and `Internal` are faults; see
/// [`MarketError::is_internal`].
#[derive(Debug, Error)]
pub enum MarketError {
  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  #[error("insufficient quantity for product {product_id}: requested {requested}, available {available}")]
  InsufficientQuantity {
    product_id: i64,
    requested: i64,
    available: i64,
  },

  #[error("product name already exists: {0}")]
  DuplicateName(String),

  #[error("caller identity is unknown")]
  Unauthorized,

  #[error("caller does not own {entity} {id}")]
  Forbidden { entity: &'static str, id: i64 },

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("workflow error: {0}")]
  Workflow(#[from] WorkflowError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl MarketError {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    MarketError::NotFound { entity, id }
  }

  pub fn forbidden(entity: &'static str, id: i64) -> Self {
    MarketError::Forbidden { entity, id }
  }

  /// True for storage, transport and programming faults. These are logged in
  /// full server-side and reported to end users only as a generic failure.
  pub fn is_internal(&self) -> bool {
    matches!(
      self,
      MarketError::Database(_) | MarketError::Workflow(_) | MarketError::Internal(_)
    )
  }
}

pub type MarketResult<T, E = MarketError> = std::result::Result<T, E>;
