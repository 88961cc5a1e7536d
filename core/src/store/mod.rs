// bazaar/src/store/mod.rs

//! Storage seams. The catalog (products, receipts) and the account directory
//! (users, bank accounts) are separate traits so either can be swapped out.
//! [`postgres::PgMarketStore`] and [`memory::MemoryMarketStore`] implement both.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MarketResult;
use crate::filter::ListingQuery;
use crate::models::{
  BankAccount, BankAccountId, LockedProduct, Payment, PaymentDraft, Product, ProductDraft, ProductId, UserId,
  UserIdentity,
};

pub use memory::MemoryMarketStore;
pub use postgres::PgMarketStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Fails with `DuplicateName` when the name is taken.
  async fn insert_product(&self, owner: UserId, draft: &ProductDraft) -> MarketResult<Product>;

  /// Replaces the commercial attributes. Fails with `NotFound` or `DuplicateName`.
  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> MarketResult<Product>;

  async fn set_stock(&self, id: ProductId, stock: i64) -> MarketResult<Product>;

  async fn delete_product(&self, id: ProductId) -> MarketResult<()>;

  async fn find_product(&self, id: ProductId) -> MarketResult<Option<Product>>;

  async fn fetch_products(&self, query: &ListingQuery) -> MarketResult<Vec<Product>>;

  /// Rows matching `query`'s predicates, ignoring its order and page.
  async fn count_products(&self, query: &ListingQuery) -> MarketResult<i64>;

  /// Sum of `purchase_count` over every product the owner lists.
  async fn total_sold_by_owner(&self, owner: UserId) -> MarketResult<i64>;

  async fn find_payment(&self, id: Uuid) -> MarketResult<Option<Payment>>;

  /// Opens the transaction a single purchase runs in.
  async fn begin_purchase(&self) -> MarketResult<Box<dyn PurchaseTx>>;
}

/// A purchase in flight. Nothing it writes is visible to others before
/// `commit`; dropping it without committing discards every write.
#[async_trait]
pub trait PurchaseTx: Send {
  /// Takes the exclusive row lock and returns the row as it is now. Blocks
  /// while another purchase holds the lock.
  async fn lock_product(&mut self, id: ProductId) -> MarketResult<Option<LockedProduct>>;

  /// Stock down by `quantity`, sold counter up by `quantity`.
  async fn record_sale(&mut self, id: ProductId, quantity: i64) -> MarketResult<()>;

  async fn insert_payment(&mut self, draft: &PaymentDraft) -> MarketResult<Payment>;

  async fn commit(self: Box<Self>) -> MarketResult<()>;

  async fn rollback(self: Box<Self>) -> MarketResult<()>;
}

/// Read-only lookups of users and their bank accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
  async fn find_user(&self, id: UserId) -> MarketResult<Option<UserIdentity>>;

  async fn find_bank_account(&self, id: BankAccountId) -> MarketResult<Option<BankAccount>>;

  async fn bank_accounts_of(&self, owner: UserId) -> MarketResult<Vec<BankAccount>>;
}
