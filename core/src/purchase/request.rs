// bazaar/src/purchase/request.rs

use crate::error::{MarketError, MarketResult};
use crate::models::{BankAccountId, ProductId, UserId};
use crate::validation::{require_positive_id, require_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyRequest {
  pub product_id: ProductId,
  pub bank_account_id: BankAccountId,
  pub quantity: i64,
  pub payment_proof_image_url: String,
  /// The authenticated caller, snapshotted onto the receipt when present.
  pub buyer_id: Option<UserId>,
}

impl BuyRequest {
  pub fn validate(&self) -> MarketResult<()> {
    require_positive_id("productId", self.product_id)?;
    require_positive_id("bankAccountId", self.bank_account_id)?;
    if self.quantity < 1 {
      return Err(MarketError::Validation("quantity must be at least 1".into()));
    }
    require_url("paymentProofImageUrl", &self.payment_proof_image_url)?;
    if let Some(buyer) = self.buyer_id {
      require_positive_id("buyerId", buyer)?;
    }
    Ok(())
  }
}
