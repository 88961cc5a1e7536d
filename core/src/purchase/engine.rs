// bazaar/src/purchase/engine.rs

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::context::{PurchaseCtxData, TxSlot};
use super::request::BuyRequest;
use crate::error::{MarketError, MarketResult};
use crate::models::{Payment, PaymentDraft};
use crate::store::{AccountDirectory, CatalogStore};
use crate::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, SkipCondition};

/// Runs purchases. Holds no state between calls other than the store handles
/// and the step pipeline, which is built once.
pub struct PurchaseEngine {
  catalog: Arc<dyn CatalogStore>,
  accounts: Arc<dyn AccountDirectory>,
  pipeline: Pipeline<PurchaseCtxData, MarketError>,
}

impl std::fmt::Debug for PurchaseEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PurchaseEngine")
      .field("steps", &self.pipeline.step_names())
      .finish()
  }
}

impl PurchaseEngine {
  pub fn new(catalog: Arc<dyn CatalogStore>, accounts: Arc<dyn AccountDirectory>) -> Self {
    Self {
      catalog,
      accounts,
      pipeline: build_pipeline(),
    }
  }

  pub fn step_names(&self) -> Vec<String> {
    self.pipeline.step_names()
  }

  /// Buys `request.quantity` units of a product against a seller's bank
  /// account and returns the stored receipt.
  ///
  /// Concurrent buys of one product are serialized by the store's row lock, so
  /// stock is never oversold. On any failure the transaction is rolled back
  /// and neither stock, the sold counter nor the receipts change. Dropping the
  /// returned future mid-flight drops the transaction, with the same effect.
  #[instrument(
    name = "PurchaseEngine::buy",
    skip(self, request),
    fields(
      product_id = request.product_id,
      bank_account_id = request.bank_account_id,
      quantity = request.quantity
    )
  )]
  pub async fn buy(&self, request: BuyRequest) -> MarketResult<Payment> {
    let slot = TxSlot::default();
    let ctx = ContextData::new(PurchaseCtxData::new(
      Arc::clone(&self.catalog),
      Arc::clone(&self.accounts),
      request,
      slot.clone(),
    ));

    let outcome = self.pipeline.run(ctx.clone()).await;

    // Still holding a transaction here means the run did not reach commit.
    if let Some(tx) = slot.take().await {
      if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, "Rollback after failed purchase also failed.");
      }
    }

    let result = match outcome {
      Ok(PipelineResult::Completed) => {
        let receipt = ctx.write().receipt.take();
        receipt.ok_or_else(|| MarketError::Internal("purchase completed without a receipt".into()))
      }
      Ok(PipelineResult::Stopped) => Err(MarketError::Internal("purchase halted before commit".into())),
      Err(e) => Err(e),
    };

    match &result {
      Ok(payment) => info!(payment_id = %payment.id, "Purchase recorded."),
      Err(e) if e.is_internal() => error!(error = %e, "Purchase failed."),
      Err(e) => info!(error = %e, "Purchase rejected."),
    }
    result
  }
}

fn build_pipeline() -> Pipeline<PurchaseCtxData, MarketError> {
  let anonymous: SkipCondition<PurchaseCtxData> =
    Arc::new(|ctx: ContextData<PurchaseCtxData>| ctx.read().request.buyer_id.is_none());

  let mut p = Pipeline::<PurchaseCtxData, MarketError>::new(&[
    ("validate_request", false, None),
    ("resolve_bank_account", false, None),
    ("resolve_seller", false, None),
    ("resolve_buyer", false, Some(anonymous)),
    ("open_transaction", false, None),
    ("lock_product", false, None),
    ("check_stock", false, None),
    ("apply_sale", false, None),
    ("record_receipt", false, None),
    ("commit", false, None),
  ]);

  p.on_root("validate_request", validate_request);
  p.on_root("resolve_bank_account", resolve_bank_account);
  p.on_root("resolve_seller", resolve_seller);
  p.on_root("resolve_buyer", resolve_buyer);
  p.on_root("open_transaction", open_transaction);
  p.on_root("lock_product", lock_product);
  p.on_root("check_stock", check_stock);
  p.on_root("apply_sale", apply_sale);
  p.on_root("record_receipt", record_receipt);
  p.on_root("commit", commit);
  p
}

type StepResult = MarketResult<PipelineControl>;

fn missing(what: &str) -> MarketError {
  MarketError::Internal(format!("purchase step ran before {} was resolved", what))
}

async fn validate_request(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  ctx.read().request.validate()?;
  Ok(PipelineControl::Continue)
}

async fn resolve_bank_account(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (accounts, id) = {
    let guard = ctx.read();
    (Arc::clone(&guard.accounts), guard.request.bank_account_id)
  };
  let account = accounts
    .find_bank_account(id)
    .await?
    .ok_or_else(|| MarketError::not_found("bank account", id))?;
  ctx.write().bank_account = Some(account);
  Ok(PipelineControl::Continue)
}

async fn resolve_seller(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (accounts, seller_id) = {
    let guard = ctx.read();
    let bank = guard.bank_account.as_ref().ok_or_else(|| missing("the bank account"))?;
    (Arc::clone(&guard.accounts), bank.owner_id)
  };
  let seller = accounts
    .find_user(seller_id)
    .await?
    .ok_or_else(|| MarketError::not_found("seller", seller_id))?;
  ctx.write().seller = Some(seller);
  Ok(PipelineControl::Continue)
}

async fn resolve_buyer(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (accounts, buyer_id) = {
    let guard = ctx.read();
    (Arc::clone(&guard.accounts), guard.request.buyer_id)
  };
  let Some(buyer_id) = buyer_id else {
    return Ok(PipelineControl::Continue);
  };
  let buyer = accounts.find_user(buyer_id).await?.ok_or(MarketError::Unauthorized)?;
  ctx.write().buyer = Some(buyer);
  Ok(PipelineControl::Continue)
}

async fn open_transaction(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (catalog, slot) = {
    let guard = ctx.read();
    (Arc::clone(&guard.catalog), guard.tx.clone())
  };
  let tx = catalog.begin_purchase().await?;
  slot.put(tx).await;
  Ok(PipelineControl::Continue)
}

async fn lock_product(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (slot, product_id) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.request.product_id)
  };
  let locked = slot
    .lock_product(product_id)
    .await?
    .ok_or_else(|| MarketError::not_found("product", product_id))?;
  ctx.write().locked = Some(locked);
  Ok(PipelineControl::Continue)
}

async fn check_stock(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let guard = ctx.read();
  let locked = guard.locked.as_ref().ok_or_else(|| missing("the product row"))?;
  let requested = guard.request.quantity;
  if locked.stock < requested {
    return Err(MarketError::InsufficientQuantity {
      product_id: locked.id,
      requested,
      available: locked.stock,
    });
  }
  Ok(PipelineControl::Continue)
}

async fn apply_sale(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (slot, product_id, quantity) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.request.product_id, guard.request.quantity)
  };
  slot.record_sale(product_id, quantity).await?;
  Ok(PipelineControl::Continue)
}

async fn record_receipt(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let (slot, draft) = {
    let guard = ctx.read();
    let product = guard.locked.as_ref().ok_or_else(|| missing("the product row"))?;
    let seller = guard.seller.as_ref().ok_or_else(|| missing("the seller"))?;
    let bank = guard.bank_account.as_ref().ok_or_else(|| missing("the bank account"))?;
    let buyer = guard.buyer.as_ref();
    let draft = PaymentDraft {
      product_id: product.id,
      bank_account_id: bank.id,
      quantity: guard.request.quantity,
      payment_proof_image_url: guard.request.payment_proof_image_url.trim().to_string(),
      product_name: product.name.clone(),
      product_image_url: product.image_url.clone(),
      product_price: product.price,
      seller_id: seller.id,
      seller_username: seller.username.clone(),
      seller_name: seller.name.clone(),
      buyer_id: buyer.map(|b| b.id),
      buyer_username: buyer.map(|b| b.username.clone()),
      buyer_name: buyer.map(|b| b.name.clone()),
      bank_name: bank.bank_name.clone(),
      bank_account_name: bank.bank_account_name.clone(),
      bank_account_number: bank.bank_account_number.clone(),
    };
    (guard.tx.clone(), draft)
  };
  let receipt = slot.insert_payment(&draft).await?;
  ctx.write().receipt = Some(receipt);
  Ok(PipelineControl::Continue)
}

async fn commit(ctx: ContextData<PurchaseCtxData>) -> StepResult {
  let slot = ctx.read().tx.clone();
  let tx = slot
    .take()
    .await
    .ok_or_else(|| MarketError::Internal("no transaction to commit".into()))?;
  tx.commit().await?;
  Ok(PipelineControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryMarketStore;

  #[test]
  fn steps_run_in_purchase_order() {
    let store = Arc::new(MemoryMarketStore::new());
    let engine = PurchaseEngine::new(store.clone(), store);
    assert_eq!(
      engine.step_names(),
      vec![
        "validate_request",
        "resolve_bank_account",
        "resolve_seller",
        "resolve_buyer",
        "open_transaction",
        "lock_product",
        "check_stock",
        "apply_sale",
        "record_receipt",
        "commit",
      ]
    );
  }
}
