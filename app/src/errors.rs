// bazaar/app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bazaar::MarketError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("The purchase did not finish in time")]
  Timeout,

  #[error(transparent)]
  Market(#[from] MarketError),
}

impl AppError {
  fn is_internal(&self) -> bool {
    match self {
      AppError::Config(_) => true,
      AppError::Market(e) => e.is_internal(),
      _ => false,
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Market(e) => match e {
        MarketError::Validation(_) | MarketError::InsufficientQuantity { .. } | MarketError::DuplicateName(_) => {
          StatusCode::BAD_REQUEST
        }
        MarketError::Unauthorized => StatusCode::UNAUTHORIZED,
        MarketError::Forbidden { .. } => StatusCode::FORBIDDEN,
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::Database(_) | MarketError::Workflow(_) | MarketError::Internal(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if self.is_internal() {
      // Details stay in the log; the client only learns that something broke.
      tracing::error!(application_error = %self, "Responding with internal error");
      return HttpResponse::build(status).json(json!({"error": "An internal error occurred"}));
    }
    tracing::info!(application_error = %self, status = status.as_u16(), "Responding with error");
    HttpResponse::build(status).json(json!({"error": self.to_string()}))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
