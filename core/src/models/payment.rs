// bazaar/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::{BankAccountId, ProductId, UserId};

/// A purchase receipt. Written once inside the purchase transaction and never
/// changed afterwards; the snapshot columns keep the values seen at purchase
/// time regardless of later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Payment {
  pub id: Uuid,
  pub product_id: ProductId,
  pub bank_account_id: BankAccountId,
  pub quantity: i64,
  pub payment_proof_image_url: String,

  pub product_name: String,
  pub product_image_url: String,
  pub product_price: i64,

  pub seller_id: UserId,
  pub seller_username: String,
  pub seller_name: String,

  pub buyer_id: Option<UserId>,
  pub buyer_username: Option<String>,
  pub buyer_name: Option<String>,

  pub bank_name: String,
  pub bank_account_name: String,
  pub bank_account_number: String,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Everything on a [`Payment`] except what the store assigns (id, timestamps).
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
  pub product_id: ProductId,
  pub bank_account_id: BankAccountId,
  pub quantity: i64,
  pub payment_proof_image_url: String,
  pub product_name: String,
  pub product_image_url: String,
  pub product_price: i64,
  pub seller_id: UserId,
  pub seller_username: String,
  pub seller_name: String,
  pub buyer_id: Option<UserId>,
  pub buyer_username: Option<String>,
  pub buyer_name: Option<String>,
  pub bank_name: String,
  pub bank_account_name: String,
  pub bank_account_number: String,
}

impl PaymentDraft {
  pub fn into_payment(self, id: Uuid, at: DateTime<Utc>) -> Payment {
    Payment {
      id,
      product_id: self.product_id,
      bank_account_id: self.bank_account_id,
      quantity: self.quantity,
      payment_proof_image_url: self.payment_proof_image_url,
      product_name: self.product_name,
      product_image_url: self.product_image_url,
      product_price: self.product_price,
      seller_id: self.seller_id,
      seller_username: self.seller_username,
      seller_name: self.seller_name,
      buyer_id: self.buyer_id,
      buyer_username: self.buyer_username,
      buyer_name: self.buyer_name,
      bank_name: self.bank_name,
      bank_account_name: self.bank_account_name,
      bank_account_number: self.bank_account_number,
      created_at: at,
      updated_at: at,
    }
  }
}
