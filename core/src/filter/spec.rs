// bazaar/src/filter/spec.rs

use std::str::FromStr;

use crate::error::MarketError;
use crate::models::ProductCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  Price,
  /// Creation order.
  Date,
}

impl FromStr for SortKey {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "price" => Ok(SortKey::Price),
      "date" => Ok(SortKey::Date),
      other => Err(MarketError::Validation(format!(
        "sortBy must be 'price' or 'date', got '{}'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl FromStr for SortDirection {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "asc" => Ok(SortDirection::Asc),
      // "dsc" is what older clients send.
      "desc" | "dsc" => Ok(SortDirection::Desc),
      other => Err(MarketError::Validation(format!(
        "orderBy must be 'asc' or 'desc', got '{}'",
        other
      ))),
    }
  }
}

/// What a listing request asks for. Request scoped, never persisted.
///
/// Every present field narrows the result (logical AND). `limit` and `offset`
/// values of zero or below mean "no limit" and "no offset".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
  /// Only the caller's own products. Ignored for anonymous callers.
  pub user_only: bool,
  /// The product must carry every one of these tags.
  pub tags: Vec<String>,
  pub condition: Option<ProductCondition>,
  /// Include products whose stock is zero.
  pub show_empty_stock: bool,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  /// Case-insensitive substring of the product name.
  pub search: Option<String>,
  /// `None` leaves the order to the store.
  pub sort_by: Option<SortKey>,
  pub order_by: SortDirection,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_accepts_legacy_spelling() {
    assert_eq!("dsc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
    assert!("up".parse::<SortDirection>().is_err());
  }

  #[test]
  fn sort_key_rejects_unknown_columns() {
    assert_eq!("price".parse::<SortKey>().unwrap(), SortKey::Price);
    assert_eq!("date".parse::<SortKey>().unwrap(), SortKey::Date);
    assert!("name".parse::<SortKey>().is_err());
  }
}
