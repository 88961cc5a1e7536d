// bazaar/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::{ProductId, UserId};
use crate::error::{MarketError, MarketResult};
use crate::validation::{require_len, require_non_negative, require_url, PRODUCT_NAME_MAX, PRODUCT_NAME_MIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_condition", rename_all = "lowercase")]
pub enum ProductCondition {
  New,
  Second,
}

impl ProductCondition {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProductCondition::New => "new",
      ProductCondition::Second => "second",
    }
  }
}

impl fmt::Display for ProductCondition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductCondition {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "new" => Ok(ProductCondition::New),
      "second" => Ok(ProductCondition::Second),
      other => Err(MarketError::Validation(format!(
        "condition must be 'new' or 'second', got '{}'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: ProductId,
  #[sqlx(rename = "user_id")]
  pub owner_id: UserId,
  pub name: String,
  pub price: i64,
  pub image_url: String,
  pub stock: i64,
  pub condition: ProductCondition,
  pub tags: Vec<String>,
  pub is_purchasable: bool,
  /// Cumulative units sold. Only ever grows.
  pub purchase_count: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Seller-supplied commercial attributes, used for both create and update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDraft {
  pub name: String,
  pub price: i64,
  pub image_url: String,
  pub stock: i64,
  pub condition: ProductCondition,
  pub tags: Vec<String>,
  pub is_purchasable: bool,
}

impl ProductDraft {
  pub fn validate(&self) -> MarketResult<()> {
    require_len("name", &self.name, PRODUCT_NAME_MIN, PRODUCT_NAME_MAX)?;
    require_non_negative("price", self.price)?;
    require_non_negative("stock", self.stock)?;
    require_url("imageUrl", &self.image_url)?;
    if self.tags.is_empty() {
      return Err(MarketError::Validation("tags must contain at least one entry".into()));
    }
    if self.tags.iter().any(|t| t.trim().is_empty()) {
      return Err(MarketError::Validation("tags must not contain empty entries".into()));
    }
    Ok(())
  }
}

/// The columns the purchase path reads under the row lock.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LockedProduct {
  pub id: ProductId,
  pub name: String,
  pub image_url: String,
  pub price: i64,
  pub stock: i64,
}

impl From<&Product> for LockedProduct {
  fn from(p: &Product) -> Self {
    LockedProduct {
      id: p.id,
      name: p.name.clone(),
      image_url: p.image_url.clone(),
      price: p.price,
      stock: p.stock,
    }
  }
}
