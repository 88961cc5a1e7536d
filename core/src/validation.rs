// bazaar/src/validation.rs

//! Input checks shared by the purchase engine and the catalog service. The
//! HTTP layer validates first; these run again inside the core.

use crate::error::{MarketError, MarketResult};
use url::Url;

pub const PRODUCT_NAME_MIN: usize = 5;
pub const PRODUCT_NAME_MAX: usize = 60;

/// Accepts absolute `http`/`https` URLs with a host.
pub fn require_url(field: &str, value: &str) -> MarketResult<()> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(MarketError::Validation(format!("{} is required", field)));
  }
  let parsed = Url::parse(trimmed)
    .map_err(|e| MarketError::Validation(format!("{} is not a valid URL: {}", field, e)))?;
  match parsed.scheme() {
    "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(()),
    _ => Err(MarketError::Validation(format!(
      "{} must be an http(s) URL with a host",
      field
    ))),
  }
}

/// Length bounds are counted in characters, not bytes.
pub fn require_len(field: &str, value: &str, min: usize, max: usize) -> MarketResult<()> {
  let len = value.chars().count();
  if len < min || len > max {
    return Err(MarketError::Validation(format!(
      "{} must be between {} and {} characters",
      field, min, max
    )));
  }
  Ok(())
}

pub fn require_positive_id(field: &str, value: i64) -> MarketResult<()> {
  if value <= 0 {
    return Err(MarketError::Validation(format!("{} must be a positive integer", field)));
  }
  Ok(())
}

pub fn require_non_negative(field: &str, value: i64) -> MarketResult<()> {
  if value < 0 {
    return Err(MarketError::Validation(format!("{} must not be negative", field)));
  }
  Ok(())
}
