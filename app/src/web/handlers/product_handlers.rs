// bazaar/app/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::{BankAccount, FilterSpec, Product, ProductCondition, ProductDraft, SellerSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, MaybeUser};

// --- Response shapes ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
  pub product_id: String,
  pub name: String,
  pub price: i64,
  pub image_url: String,
  pub stock: i64,
  pub condition: ProductCondition,
  pub tags: Vec<String>,
  pub is_purchaseable: bool,
  pub purchase_count: i64,
}

impl From<Product> for ProductResponse {
  fn from(p: Product) -> Self {
    ProductResponse {
      product_id: p.id.to_string(),
      name: p.name,
      price: p.price,
      image_url: p.image_url,
      stock: p.stock,
      condition: p.condition,
      tags: p.tags,
      is_purchaseable: p.is_purchasable,
      purchase_count: p.purchase_count,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountResponse {
  pub bank_account_id: String,
  pub bank_name: String,
  pub bank_account_name: String,
  pub bank_account_number: String,
}

impl From<BankAccount> for BankAccountResponse {
  fn from(b: BankAccount) -> Self {
    BankAccountResponse {
      bank_account_id: b.id.to_string(),
      bank_name: b.bank_name,
      bank_account_name: b.bank_account_name,
      bank_account_number: b.bank_account_number,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerResponse {
  pub name: String,
  pub product_sold_total: i64,
  pub bank_accounts: Vec<BankAccountResponse>,
}

impl From<SellerSummary> for SellerResponse {
  fn from(s: SellerSummary) -> Self {
    SellerResponse {
      name: s.name,
      product_sold_total: s.product_sold_total,
      bank_accounts: s.bank_accounts.into_iter().map(Into::into).collect(),
    }
  }
}

// --- Request shapes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
  pub name: String,
  pub price: i64,
  pub image_url: String,
  pub stock: i64,
  pub condition: ProductCondition,
  pub tags: Vec<String>,
  #[serde(alias = "isPurchasable")]
  pub is_purchaseable: bool,
}

impl From<ProductPayload> for ProductDraft {
  fn from(p: ProductPayload) -> Self {
    ProductDraft {
      name: p.name,
      price: p.price,
      image_url: p.image_url,
      stock: p.stock,
      condition: p.condition,
      tags: p.tags,
      is_purchasable: p.is_purchaseable,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct StockPayload {
  pub stock: i64,
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
  match value {
    "true" | "1" => Ok(true),
    "false" | "0" => Ok(false),
    other => Err(AppError::Validation(format!("{} must be true or false, got '{}'", key, other))),
  }
}

fn parse_amount(key: &str, value: &str) -> Result<i64> {
  match value.parse::<i64>() {
    Ok(n) if n >= 0 => Ok(n),
    _ => Err(AppError::Validation(format!(
      "{} must be a non-negative integer, got '{}'",
      key, value
    ))),
  }
}

/// Turns the raw listing query string into a [`FilterSpec`].
///
/// Pairs are read as a list so `tags` can repeat; each value may also be a
/// comma-separated list. Empty values count as absent and unknown keys are
/// ignored.
pub fn filter_from_pairs(pairs: &[(String, String)]) -> Result<FilterSpec> {
  let mut spec = FilterSpec::default();
  for (key, value) in pairs {
    let value = value.trim();
    if value.is_empty() {
      continue;
    }
    match key.as_str() {
      "userOnly" => spec.user_only = parse_flag(key, value)?,
      "showEmptyStock" => spec.show_empty_stock = parse_flag(key, value)?,
      "limit" => spec.limit = Some(parse_amount(key, value)?),
      "offset" => spec.offset = Some(parse_amount(key, value)?),
      "minPrice" => spec.min_price = Some(parse_amount(key, value)?),
      "maxPrice" => spec.max_price = Some(parse_amount(key, value)?),
      "tags" => spec.tags.extend(
        value
          .split(',')
          .map(str::trim)
          .filter(|t| !t.is_empty())
          .map(str::to_string),
      ),
      "condition" => spec.condition = Some(value.parse::<ProductCondition>()?),
      "sortBy" => spec.sort_by = Some(value.parse()?),
      "orderBy" => spec.order_by = value.parse()?,
      "search" => spec.search = Some(value.to_string()),
      _ => {}
    }
  }
  Ok(spec)
}

// --- Handlers ---

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  caller: MaybeUser,
  query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse> {
  let spec = filter_from_pairs(&query.into_inner())?;
  let page = app_state.catalog.list_products(&spec, caller.0).await?;

  info!("Listed {} of {} matching products.", page.products.len(), page.total);

  let products: Vec<ProductResponse> = page.products.into_iter().map(Into::into).collect();
  Ok(HttpResponse::Ok().json(json!({
      "message": "ok",
      "data": products,
      "meta": {
        "limit": page.limit,
        "offset": page.offset,
        "total": page.total,
      }
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let detail = app_state.catalog.product_detail(product_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "ok",
      "data": {
        "product": ProductResponse::from(detail.product),
        "seller": SellerResponse::from(detail.seller),
      }
  })))
}

#[instrument(name = "handler::create_product", skip(app_state, body), fields(user_id = user.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  body: web::Json<ProductPayload>,
) -> Result<HttpResponse> {
  let product = app_state
    .catalog
    .create_product(user.user_id, body.into_inner().into())
    .await?;

  info!(product_id = product.id, "Product created.");
  Ok(HttpResponse::Ok().json(json!({
      "message": "product added successfully",
      "data": ProductResponse::from(product)
  })))
}

#[instrument(
  name = "handler::update_product",
  skip(app_state, path, body),
  fields(user_id = user.user_id, product_id = %path.as_ref())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<i64>,
  body: web::Json<ProductPayload>,
) -> Result<HttpResponse> {
  let product = app_state
    .catalog
    .update_product(user.user_id, path.into_inner(), body.into_inner().into())
    .await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "product updated successfully",
      "data": ProductResponse::from(product)
  })))
}

#[instrument(
  name = "handler::update_stock",
  skip(app_state, path, body),
  fields(user_id = user.user_id, product_id = %path.as_ref())
)]
pub async fn update_stock_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<i64>,
  body: web::Json<StockPayload>,
) -> Result<HttpResponse> {
  let product = app_state
    .catalog
    .set_stock(user.user_id, path.into_inner(), body.stock)
    .await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "stock updated successfully",
      "data": ProductResponse::from(product)
  })))
}

#[instrument(
  name = "handler::delete_product",
  skip(app_state, path),
  fields(user_id = user.user_id, product_id = %path.as_ref())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  app_state.catalog.delete_product(user.user_id, product_id).await?;

  info!(product_id, "Product deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "product deleted successfully" })))
}
