// bazaar/src/store/memory.rs

//! In-process implementation of both store traits, with the same locking
//! contract as the PostgreSQL one: each product row has an async mutex that
//! purchases and seller writes take for their whole duration, and purchase
//! writes stay staged inside the transaction until `commit`.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::instrument;
use uuid::Uuid;

use super::{AccountDirectory, CatalogStore, PurchaseTx};
use crate::error::{MarketError, MarketResult};
use crate::filter::ListingQuery;
use crate::models::{
  BankAccount, BankAccountId, LockedProduct, Payment, PaymentDraft, Product, ProductDraft, ProductId, UserId,
  UserIdentity,
};

struct ProductRow {
  /// Held by whoever is writing the row. tokio's mutex queues waiters FIFO.
  lock: Arc<tokio::sync::Mutex<()>>,
  /// Last committed state. `None` once deleted.
  committed: RwLock<Option<Product>>,
}

impl ProductRow {
  fn snapshot(&self) -> Option<Product> {
    self.committed.read().clone()
  }
}

#[derive(Default)]
struct Inner {
  products: RwLock<BTreeMap<ProductId, Arc<ProductRow>>>,
  /// Unique product names.
  names: Mutex<HashMap<String, ProductId>>,
  users: RwLock<BTreeMap<UserId, UserIdentity>>,
  banks: RwLock<BTreeMap<BankAccountId, BankAccount>>,
  payments: RwLock<Vec<Payment>>,
  next_product_id: AtomicI64,
  next_user_id: AtomicI64,
  next_bank_id: AtomicI64,
}

impl Inner {
  fn row(&self, id: ProductId) -> Option<Arc<ProductRow>> {
    self.products.read().get(&id).cloned()
  }

  fn committed_products(&self) -> Vec<Product> {
    self
      .products
      .read()
      .values()
      .filter_map(|row| row.snapshot())
      .collect()
  }
}

#[derive(Clone, Default)]
pub struct MemoryMarketStore {
  inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryMarketStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemoryMarketStore")
      .field("products", &self.inner.products.read().len())
      .field("payments", &self.inner.payments.read().len())
      .finish()
  }
}

impl MemoryMarketStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_user(&self, username: &str, name: &str) -> UserIdentity {
    let id = self.inner.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
    let user = UserIdentity {
      id,
      username: username.to_string(),
      name: name.to_string(),
    };
    self.inner.users.write().insert(id, user.clone());
    user
  }

  pub fn add_bank_account(
    &self,
    owner: UserId,
    bank_name: &str,
    bank_account_name: &str,
    bank_account_number: &str,
  ) -> BankAccount {
    let id = self.inner.next_bank_id.fetch_add(1, Ordering::SeqCst) + 1;
    let account = BankAccount {
      id,
      owner_id: owner,
      bank_name: bank_name.to_string(),
      bank_account_name: bank_account_name.to_string(),
      bank_account_number: bank_account_number.to_string(),
    };
    self.inner.banks.write().insert(id, account.clone());
    account
  }

  pub fn remove_user(&self, id: UserId) {
    self.inner.users.write().remove(&id);
  }

  /// Every committed receipt, oldest first.
  pub fn payments(&self) -> Vec<Payment> {
    self.inner.payments.read().clone()
  }

  /// Takes the row lock of `id` for a seller write. `None` if the product is
  /// missing, or was deleted while this caller waited.
  async fn lock_for_write(&self, id: ProductId) -> Option<(Arc<ProductRow>, OwnedMutexGuard<()>)> {
    let row = self.inner.row(id)?;
    let guard = Arc::clone(&row.lock).lock_owned().await;
    if row.committed.read().is_none() {
      return None;
    }
    Some((row, guard))
  }
}

#[async_trait]
impl CatalogStore for MemoryMarketStore {
  #[instrument(name = "MemoryMarketStore::insert_product", skip(self, draft), fields(name = %draft.name))]
  async fn insert_product(&self, owner: UserId, draft: &ProductDraft) -> MarketResult<Product> {
    let mut names = self.inner.names.lock();
    if names.contains_key(&draft.name) {
      return Err(MarketError::DuplicateName(draft.name.clone()));
    }
    let id = self.inner.next_product_id.fetch_add(1, Ordering::SeqCst) + 1;
    let now = Utc::now();
    let product = Product {
      id,
      owner_id: owner,
      name: draft.name.clone(),
      price: draft.price,
      image_url: draft.image_url.clone(),
      stock: draft.stock,
      condition: draft.condition,
      tags: draft.tags.clone(),
      is_purchasable: draft.is_purchasable,
      purchase_count: 0,
      created_at: now,
      updated_at: now,
    };
    names.insert(product.name.clone(), id);
    self.inner.products.write().insert(
      id,
      Arc::new(ProductRow {
        lock: Arc::new(tokio::sync::Mutex::new(())),
        committed: RwLock::new(Some(product.clone())),
      }),
    );
    Ok(product)
  }

  #[instrument(name = "MemoryMarketStore::update_product", skip(self, draft))]
  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> MarketResult<Product> {
    let (row, _guard) = self
      .lock_for_write(id)
      .await
      .ok_or_else(|| MarketError::not_found("product", id))?;

    let mut names = self.inner.names.lock();
    match names.get(&draft.name) {
      Some(holder) if *holder != id => return Err(MarketError::DuplicateName(draft.name.clone())),
      _ => {}
    }
    let mut committed = row.committed.write();
    let product = committed.as_mut().ok_or_else(|| MarketError::not_found("product", id))?;
    names.remove(&product.name);
    names.insert(draft.name.clone(), id);

    product.name = draft.name.clone();
    product.price = draft.price;
    product.image_url = draft.image_url.clone();
    product.stock = draft.stock;
    product.condition = draft.condition;
    product.tags = draft.tags.clone();
    product.is_purchasable = draft.is_purchasable;
    product.updated_at = Utc::now();
    Ok(product.clone())
  }

  #[instrument(name = "MemoryMarketStore::set_stock", skip(self))]
  async fn set_stock(&self, id: ProductId, stock: i64) -> MarketResult<Product> {
    if stock < 0 {
      return Err(MarketError::Validation("stock must not be negative".into()));
    }
    let (row, _guard) = self
      .lock_for_write(id)
      .await
      .ok_or_else(|| MarketError::not_found("product", id))?;
    let mut committed = row.committed.write();
    let product = committed.as_mut().ok_or_else(|| MarketError::not_found("product", id))?;
    product.stock = stock;
    product.updated_at = Utc::now();
    Ok(product.clone())
  }

  #[instrument(name = "MemoryMarketStore::delete_product", skip(self))]
  async fn delete_product(&self, id: ProductId) -> MarketResult<()> {
    let (row, _guard) = self
      .lock_for_write(id)
      .await
      .ok_or_else(|| MarketError::not_found("product", id))?;
    let mut names = self.inner.names.lock();
    if let Some(product) = row.committed.write().take() {
      names.remove(&product.name);
    }
    self.inner.products.write().remove(&id);
    Ok(())
  }

  async fn find_product(&self, id: ProductId) -> MarketResult<Option<Product>> {
    Ok(self.inner.row(id).and_then(|row| row.snapshot()))
  }

  async fn fetch_products(&self, query: &ListingQuery) -> MarketResult<Vec<Product>> {
    let mut rows: Vec<Product> = self
      .inner
      .committed_products()
      .into_iter()
      .filter(|p| query.matches(p))
      .collect();
    query.sort(&mut rows);
    Ok(query.paginate(rows))
  }

  async fn count_products(&self, query: &ListingQuery) -> MarketResult<i64> {
    let count = self.inner.committed_products().iter().filter(|p| query.matches(p)).count();
    i64::try_from(count).map_err(|_| MarketError::Internal("product count overflow".into()))
  }

  async fn total_sold_by_owner(&self, owner: UserId) -> MarketResult<i64> {
    Ok(
      self
        .inner
        .committed_products()
        .iter()
        .filter(|p| p.owner_id == owner)
        .map(|p| p.purchase_count)
        .sum(),
    )
  }

  async fn find_payment(&self, id: Uuid) -> MarketResult<Option<Payment>> {
    Ok(self.inner.payments.read().iter().find(|p| p.id == id).cloned())
  }

  async fn begin_purchase(&self) -> MarketResult<Box<dyn PurchaseTx>> {
    Ok(Box::new(MemoryPurchaseTx {
      inner: Arc::clone(&self.inner),
      held: HashMap::new(),
      payments: Vec::new(),
    }))
  }
}

struct HeldRow {
  row: Arc<ProductRow>,
  _guard: OwnedMutexGuard<()>,
  /// The row as this transaction sees it, including its own sale.
  staged: Product,
  dirty: bool,
}

/// Holds row locks until commit, rollback or drop. Writes are staged here and
/// only become visible on commit.
pub struct MemoryPurchaseTx {
  inner: Arc<Inner>,
  held: HashMap<ProductId, HeldRow>,
  payments: Vec<Payment>,
}

#[async_trait]
impl PurchaseTx for MemoryPurchaseTx {
  async fn lock_product(&mut self, id: ProductId) -> MarketResult<Option<LockedProduct>> {
    if let Some(held) = self.held.get(&id) {
      return Ok(Some(LockedProduct::from(&held.staged)));
    }
    let Some(row) = self.inner.row(id) else {
      return Ok(None);
    };
    let guard = Arc::clone(&row.lock).lock_owned().await;
    // Re-read after the wait: the previous holder may have sold stock or deleted the row.
    let Some(current) = row.snapshot() else {
      return Ok(None);
    };
    let locked = LockedProduct::from(&current);
    self.held.insert(
      id,
      HeldRow {
        row,
        _guard: guard,
        staged: current,
        dirty: false,
      },
    );
    Ok(Some(locked))
  }

  async fn record_sale(&mut self, id: ProductId, quantity: i64) -> MarketResult<()> {
    let held = self
      .held
      .get_mut(&id)
      .ok_or_else(|| MarketError::Internal(format!("sale on product {} without its row lock", id)))?;
    if held.staged.stock < quantity {
      return Err(MarketError::Internal(format!(
        "sale on product {} would leave negative stock",
        id
      )));
    }
    held.staged.stock -= quantity;
    held.staged.purchase_count += quantity;
    held.staged.updated_at = Utc::now();
    held.dirty = true;
    Ok(())
  }

  async fn insert_payment(&mut self, draft: &PaymentDraft) -> MarketResult<Payment> {
    let payment = draft.clone().into_payment(Uuid::new_v4(), Utc::now());
    self.payments.push(payment.clone());
    Ok(payment)
  }

  async fn commit(self: Box<Self>) -> MarketResult<()> {
    let MemoryPurchaseTx { inner, held, payments } = *self;
    let mut log = inner.payments.write();
    for held in held.into_values() {
      if held.dirty {
        *held.row.committed.write() = Some(held.staged);
      }
    }
    log.extend(payments);
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> MarketResult<()> {
    Ok(())
  }
}

#[async_trait]
impl AccountDirectory for MemoryMarketStore {
  async fn find_user(&self, id: UserId) -> MarketResult<Option<UserIdentity>> {
    Ok(self.inner.users.read().get(&id).cloned())
  }

  async fn find_bank_account(&self, id: BankAccountId) -> MarketResult<Option<BankAccount>> {
    Ok(self.inner.banks.read().get(&id).cloned())
  }

  async fn bank_accounts_of(&self, owner: UserId) -> MarketResult<Vec<BankAccount>> {
    Ok(
      self
        .inner
        .banks
        .read()
        .values()
        .filter(|b| b.owner_id == owner)
        .cloned()
        .collect(),
    )
  }
}
