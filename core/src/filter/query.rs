// bazaar/src/filter/query.rs

use std::cmp::Ordering;

use super::spec::{FilterSpec, SortDirection, SortKey};
use crate::models::{Product, ProductCondition, UserId};

/// One condition a listed product must satisfy. Values are carried typed and
/// are bound as parameters when rendered to SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
  OwnedBy(UserId),
  /// The product's tags are a superset of these.
  HasAllTags(Vec<String>),
  ConditionIs(ProductCondition),
  InStock,
  MinPrice(i64),
  MaxPrice(i64),
  NameContains(String),
}

impl Predicate {
  pub fn matches(&self, product: &Product) -> bool {
    match self {
      Predicate::OwnedBy(owner) => product.owner_id == *owner,
      Predicate::HasAllTags(tags) => tags.iter().all(|t| product.tags.contains(t)),
      Predicate::ConditionIs(condition) => product.condition == *condition,
      Predicate::InStock => product.stock > 0,
      Predicate::MinPrice(min) => product.price >= *min,
      Predicate::MaxPrice(max) => product.price <= *max,
      Predicate::NameContains(needle) => fold_case(&product.name).contains(&fold_case(needle)),
    }
  }
}

/// Lowercases one char at a time, keeping only the first char of a multi-char
/// mapping (`İ` folds to `i`). This is the 1:1 mapping PostgreSQL's `ILIKE`
/// applies, where `str::to_lowercase` would grow the string.
fn fold_case(s: &str) -> String {
  s.chars().map(|c| c.to_lowercase().next().unwrap_or(c)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
  pub key: SortKey,
  pub direction: SortDirection,
}

/// Normalized pagination. `limit == None` means unbounded; `offset` is never
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
  pub limit: Option<i64>,
  pub offset: i64,
}

impl Page {
  pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
    Page {
      limit: limit.filter(|l| *l > 0),
      offset: offset.filter(|o| *o > 0).unwrap_or(0),
    }
  }
}

/// A compiled listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
  pub predicates: Vec<Predicate>,
  pub order: Option<SortOrder>,
  pub page: Page,
}

impl ListingQuery {
  pub fn compile(spec: &FilterSpec, caller: Option<UserId>) -> Self {
    let mut predicates = Vec::new();

    if spec.user_only {
      if let Some(owner) = caller {
        predicates.push(Predicate::OwnedBy(owner));
      }
    }

    let mut tags: Vec<String> = spec
      .tags
      .iter()
      .map(|t| t.trim())
      .filter(|t| !t.is_empty())
      .map(str::to_string)
      .collect();
    tags.sort();
    tags.dedup();
    if !tags.is_empty() {
      predicates.push(Predicate::HasAllTags(tags));
    }

    if let Some(condition) = spec.condition {
      predicates.push(Predicate::ConditionIs(condition));
    }
    if !spec.show_empty_stock {
      predicates.push(Predicate::InStock);
    }
    if let Some(min) = spec.min_price {
      predicates.push(Predicate::MinPrice(min));
    }
    if let Some(max) = spec.max_price {
      predicates.push(Predicate::MaxPrice(max));
    }
    if let Some(search) = spec.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      predicates.push(Predicate::NameContains(search.to_string()));
    }

    let order = spec.sort_by.map(|key| SortOrder {
      key,
      direction: spec.order_by,
    });

    ListingQuery {
      predicates,
      order,
      page: Page::new(spec.limit, spec.offset),
    }
  }

  pub fn matches(&self, product: &Product) -> bool {
    self.predicates.iter().all(|p| p.matches(product))
  }

  /// Orders by `(key, id)` in the requested direction. Leaves the slice as is
  /// when no sort key was asked for.
  pub fn sort(&self, products: &mut [Product]) {
    let Some(order) = self.order else {
      return;
    };
    products.sort_by(|a, b| {
      let primary = match order.key {
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Date => a.created_at.cmp(&b.created_at),
      };
      let ord: Ordering = primary.then(a.id.cmp(&b.id));
      match order.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
      }
    });
  }

  pub fn paginate(&self, products: Vec<Product>) -> Vec<Product> {
    let skipped = products.into_iter().skip(usize::try_from(self.page.offset).unwrap_or(usize::MAX));
    match self.page.limit {
      Some(limit) => skipped.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
      None => skipped.collect(),
    }
  }
}
