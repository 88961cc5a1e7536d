// bazaar/src/filter/sql.rs

//! PostgreSQL rendering of a [`ListingQuery`]. Every filter value goes
//! through `push_bind`; only column names and operators are written as text.

use sqlx::{Postgres, QueryBuilder};

use super::query::{ListingQuery, Predicate, SortOrder};
use super::spec::{SortDirection, SortKey};

pub(crate) const PRODUCT_COLUMNS: &str =
  "id, user_id, name, price, image_url, stock, condition, tags, is_purchasable, purchase_count, created_at, updated_at";

/// Escapes LIKE metacharacters so user text only ever matches literally.
pub fn escape_like(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len() + 2);
  for ch in raw.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}

fn push_predicates(qb: &mut QueryBuilder<'static, Postgres>, predicates: &[Predicate]) {
  for (idx, predicate) in predicates.iter().enumerate() {
    qb.push(if idx == 0 { " WHERE " } else { " AND " });
    match predicate {
      Predicate::OwnedBy(owner) => {
        qb.push("user_id = ").push_bind(*owner);
      }
      Predicate::HasAllTags(tags) => {
        qb.push("tags @> ").push_bind(tags.clone());
      }
      Predicate::ConditionIs(condition) => {
        qb.push("condition = ").push_bind(*condition);
      }
      Predicate::InStock => {
        qb.push("stock > 0");
      }
      Predicate::MinPrice(min) => {
        qb.push("price >= ").push_bind(*min);
      }
      Predicate::MaxPrice(max) => {
        qb.push("price <= ").push_bind(*max);
      }
      Predicate::NameContains(needle) => {
        qb.push("name ILIKE ")
          .push_bind(format!("%{}%", escape_like(needle)))
          .push(" ESCAPE '\\'");
      }
    }
  }
}

fn push_order(qb: &mut QueryBuilder<'static, Postgres>, order: &SortOrder) {
  let column = match order.key {
    SortKey::Price => "price",
    SortKey::Date => "created_at",
  };
  let dir = match order.direction {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  };
  qb.push(format!(" ORDER BY {column} {dir}, id {dir}"));
}

impl ListingQuery {
  /// The page of product rows.
  pub fn fetch_sql(&self) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
    push_predicates(&mut qb, &self.predicates);
    if let Some(order) = &self.order {
      push_order(&mut qb, order);
    }
    if let Some(limit) = self.page.limit {
      qb.push(" LIMIT ").push_bind(limit);
    }
    if self.page.offset > 0 {
      qb.push(" OFFSET ").push_bind(self.page.offset);
    }
    qb
  }

  /// Total rows matching the predicates, ignoring order and page.
  pub fn count_sql(&self) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_predicates(&mut qb, &self.predicates);
    qb
  }
}
