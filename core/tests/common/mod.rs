// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use bazaar::filter::ListingQuery;
use bazaar::models::{LockedProduct, PaymentDraft, ProductId};
use bazaar::store::{CatalogStore, MemoryMarketStore, PurchaseTx};
use bazaar::{
  BankAccount, BuyRequest, CatalogService, MarketError, MarketResult, Payment, Product, ProductCondition,
  ProductDraft, PurchaseEngine, UserIdentity,
};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Counts ERROR-level events seen while installed.
#[derive(Clone, Default)]
pub struct ErrorEvents(Arc<AtomicUsize>);

impl ErrorEvents {
  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
  fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
    if *event.metadata().level() == Level::ERROR {
      self.0.fetch_add(1, Ordering::SeqCst);
    }
  }
}

pub const PROOF_URL: &str = "https://proof.example.com/transfer-001.jpg";

pub fn draft(name: &str, price: i64, stock: i64, tags: &[&str]) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    price,
    image_url: format!("https://img.example.com/{}.jpg", name.len()),
    stock,
    condition: ProductCondition::New,
    tags: tags.iter().map(|t| t.to_string()).collect(),
    is_purchasable: true,
  }
}

/// A seeded in-memory market: one seller with a bank account, one buyer.
pub struct Market {
  pub store: Arc<MemoryMarketStore>,
  pub engine: Arc<PurchaseEngine>,
  pub catalog: CatalogService,
  pub seller: UserIdentity,
  pub buyer: UserIdentity,
  pub bank: BankAccount,
}

impl Market {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(MemoryMarketStore::new());
    let seller = store.add_user("seller01", "Sari Seller");
    let buyer = store.add_user("buyer01", "Budi Buyer");
    let bank = store.add_bank_account(seller.id, "BCA", "Sari Seller", "1234567890");
    Self {
      engine: Arc::new(PurchaseEngine::new(store.clone(), store.clone())),
      catalog: CatalogService::new(store.clone(), store.clone()),
      store,
      seller,
      buyer,
      bank,
    }
  }

  pub async fn product(&self, name: &str, price: i64, stock: i64) -> Product {
    self
      .catalog
      .create_product(self.seller.id, draft(name, price, stock, &["misc"]))
      .await
      .expect("seed product")
  }

  pub fn buy(&self, product_id: ProductId, quantity: i64) -> BuyRequest {
    BuyRequest {
      product_id,
      bank_account_id: self.bank.id,
      quantity,
      payment_proof_image_url: PROOF_URL.to_string(),
      buyer_id: Some(self.buyer.id),
    }
  }

  pub async fn current(&self, product_id: ProductId) -> Product {
    self
      .store
      .find_product(product_id)
      .await
      .unwrap()
      .expect("product exists")
  }
}

/// Delegates to another store, except that every purchase transaction fails
/// when it writes the receipt.
pub struct FailingReceiptStore {
  pub inner: Arc<dyn CatalogStore>,
}

struct FailingReceiptTx {
  inner: Box<dyn PurchaseTx>,
}

#[async_trait]
impl PurchaseTx for FailingReceiptTx {
  async fn lock_product(&mut self, id: ProductId) -> MarketResult<Option<LockedProduct>> {
    self.inner.lock_product(id).await
  }

  async fn record_sale(&mut self, id: ProductId, quantity: i64) -> MarketResult<()> {
    self.inner.record_sale(id, quantity).await
  }

  async fn insert_payment(&mut self, _draft: &PaymentDraft) -> MarketResult<Payment> {
    Err(MarketError::Internal("receipt write failed".into()))
  }

  async fn commit(self: Box<Self>) -> MarketResult<()> {
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> MarketResult<()> {
    self.inner.rollback().await
  }
}

#[async_trait]
impl CatalogStore for FailingReceiptStore {
  async fn insert_product(&self, owner: i64, draft: &ProductDraft) -> MarketResult<Product> {
    self.inner.insert_product(owner, draft).await
  }

  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> MarketResult<Product> {
    self.inner.update_product(id, draft).await
  }

  async fn set_stock(&self, id: ProductId, stock: i64) -> MarketResult<Product> {
    self.inner.set_stock(id, stock).await
  }

  async fn delete_product(&self, id: ProductId) -> MarketResult<()> {
    self.inner.delete_product(id).await
  }

  async fn find_product(&self, id: ProductId) -> MarketResult<Option<Product>> {
    self.inner.find_product(id).await
  }

  async fn fetch_products(&self, query: &ListingQuery) -> MarketResult<Vec<Product>> {
    self.inner.fetch_products(query).await
  }

  async fn count_products(&self, query: &ListingQuery) -> MarketResult<i64> {
    self.inner.count_products(query).await
  }

  async fn total_sold_by_owner(&self, owner: i64) -> MarketResult<i64> {
    self.inner.total_sold_by_owner(owner).await
  }

  async fn find_payment(&self, id: Uuid) -> MarketResult<Option<Payment>> {
    self.inner.find_payment(id).await
  }

  async fn begin_purchase(&self) -> MarketResult<Box<dyn PurchaseTx>> {
    let inner = self.inner.begin_purchase().await?;
    Ok(Box::new(FailingReceiptTx { inner }))
  }
}
