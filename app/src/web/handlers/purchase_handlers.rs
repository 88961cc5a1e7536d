// bazaar/app/src/web/handlers/purchase_handlers.rs

use actix_web::{web, HttpResponse};
use bazaar::{BuyRequest, Payment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// Older clients send ids as strings, newer ones as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
  Number(i64),
  Text(String),
}

impl IdParam {
  fn parse(&self, field: &str) -> Result<i64> {
    match self {
      IdParam::Number(n) => Ok(*n),
      IdParam::Text(s) => s
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{} must be a numeric id, got '{}'", field, s))),
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyPayload {
  pub bank_account_id: IdParam,
  pub payment_proof_image_url: String,
  pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
  pub payment_id: String,
  pub product_id: String,
  pub bank_account_id: String,
  pub quantity: i64,
  pub payment_proof_image_url: String,
  pub product_name: String,
  pub product_image_url: String,
  pub product_price: i64,
  pub seller_name: String,
  pub bank_name: String,
  pub bank_account_name: String,
  pub bank_account_number: String,
  pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
  fn from(p: Payment) -> Self {
    PaymentResponse {
      payment_id: p.id.to_string(),
      product_id: p.product_id.to_string(),
      bank_account_id: p.bank_account_id.to_string(),
      quantity: p.quantity,
      payment_proof_image_url: p.payment_proof_image_url,
      product_name: p.product_name,
      product_image_url: p.product_image_url,
      product_price: p.product_price,
      seller_name: p.seller_name,
      bank_name: p.bank_name,
      bank_account_name: p.bank_account_name,
      bank_account_number: p.bank_account_number,
      created_at: p.created_at,
    }
  }
}

#[instrument(
  name = "handler::buy_product",
  skip(app_state, path, body),
  fields(user_id = user.user_id, product_id = %path.as_ref())
)]
pub async fn buy_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<i64>,
  body: web::Json<BuyPayload>,
) -> Result<HttpResponse> {
  let payload = body.into_inner();
  let request = BuyRequest {
    product_id: path.into_inner(),
    bank_account_id: payload.bank_account_id.parse("bankAccountId")?,
    quantity: payload.quantity,
    payment_proof_image_url: payload.payment_proof_image_url,
    buyer_id: Some(user.user_id),
  };

  // Dropping the buy future on timeout releases its transaction and row lock.
  let deadline = app_state.config.purchase_deadline;
  let receipt = match tokio::time::timeout(deadline, app_state.purchases.buy(request)).await {
    Ok(outcome) => outcome?,
    Err(_) => {
      warn!(deadline_ms = deadline.as_millis() as u64, "Purchase exceeded its deadline.");
      return Err(AppError::Timeout);
    }
  };

  info!(payment_id = %receipt.id, quantity = receipt.quantity, "Purchase recorded.");
  Ok(HttpResponse::Ok().json(json!({
      "message": "payment processed successfully",
      "data": PaymentResponse::from(receipt)
  })))
}
