// bazaar/src/purchase/context.rs

use std::sync::Arc;

use super::request::BuyRequest;
use crate::error::{MarketError, MarketResult};
use crate::models::{BankAccount, LockedProduct, Payment, PaymentDraft, ProductId, UserIdentity};
use crate::store::{AccountDirectory, CatalogStore, PurchaseTx};

/// Holds the open store transaction between steps. The async mutex is held
/// across the store calls, which the `ContextData` lock must never be.
#[derive(Clone, Default)]
pub(crate) struct TxSlot(Arc<tokio::sync::Mutex<Option<Box<dyn PurchaseTx>>>>);

fn no_transaction() -> MarketError {
  MarketError::Internal("purchase step ran without an open transaction".into())
}

impl TxSlot {
  pub(crate) async fn put(&self, tx: Box<dyn PurchaseTx>) {
    *self.0.lock().await = Some(tx);
  }

  pub(crate) async fn take(&self) -> Option<Box<dyn PurchaseTx>> {
    let mut slot = self.0.lock().await;
    slot.take()
  }

  pub(crate) async fn lock_product(&self, id: ProductId) -> MarketResult<Option<LockedProduct>> {
    let mut slot = self.0.lock().await;
    let tx = slot.as_mut().ok_or_else(no_transaction)?;
    let locked = tx.lock_product(id).await?;
    Ok(locked)
  }

  pub(crate) async fn record_sale(&self, id: ProductId, quantity: i64) -> MarketResult<()> {
    let mut slot = self.0.lock().await;
    let tx = slot.as_mut().ok_or_else(no_transaction)?;
    tx.record_sale(id, quantity).await?;
    Ok(())
  }

  pub(crate) async fn insert_payment(&self, draft: &PaymentDraft) -> MarketResult<Payment> {
    let mut slot = self.0.lock().await;
    let tx = slot.as_mut().ok_or_else(no_transaction)?;
    let payment = tx.insert_payment(draft).await?;
    Ok(payment)
  }
}

/// Per-run state of one purchase.
pub(crate) struct PurchaseCtxData {
  pub catalog: Arc<dyn CatalogStore>,
  pub accounts: Arc<dyn AccountDirectory>,
  pub request: BuyRequest,
  pub bank_account: Option<BankAccount>,
  pub seller: Option<UserIdentity>,
  pub buyer: Option<UserIdentity>,
  pub tx: TxSlot,
  pub locked: Option<LockedProduct>,
  pub receipt: Option<Payment>,
}

impl PurchaseCtxData {
  pub fn new(
    catalog: Arc<dyn CatalogStore>,
    accounts: Arc<dyn AccountDirectory>,
    request: BuyRequest,
    tx: TxSlot,
  ) -> Self {
    Self {
      catalog,
      accounts,
      request,
      bank_account: None,
      seller: None,
      buyer: None,
      tx,
      locked: None,
      receipt: None,
    }
  }
}
