// bazaar/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::{AccountDirectory, CatalogStore, PurchaseTx};
use crate::error::{MarketError, MarketResult};
use crate::filter::sql::PRODUCT_COLUMNS;
use crate::filter::ListingQuery;
use crate::models::{
  BankAccount, BankAccountId, LockedProduct, Payment, PaymentDraft, Product, ProductDraft, ProductId, UserId,
  UserIdentity,
};

const PAYMENT_COLUMNS: &str = "id, product_id, bank_account_id, quantity, payment_proof_image_url, \
  product_name, product_image_url, product_price, seller_id, seller_username, seller_name, \
  buyer_id, buyer_username, buyer_name, bank_name, bank_account_name, bank_account_number, \
  created_at, updated_at";

/// Catalog store and account directory over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgMarketStore {
  pool: PgPool,
}

impl PgMarketStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Applies the bundled schema migrations.
  #[instrument(name = "PgMarketStore::migrate", skip_all)]
  pub async fn migrate(&self) -> MarketResult<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| MarketError::Internal(format!("schema migration failed: {}", e)))?;
    tracing::info!("Database migrations applied.");
    Ok(())
  }
}

/// Name collisions become `DuplicateName`; everything else stays a database fault.
fn map_product_write(err: sqlx::Error, name: &str) -> MarketError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => MarketError::DuplicateName(name.to_string()),
    sqlx::Error::Database(db) if db.is_check_violation() => {
      MarketError::Validation(format!("product row rejected by constraint: {}", db.message()))
    }
    _ => MarketError::Database(err),
  }
}

#[async_trait]
impl CatalogStore for PgMarketStore {
  #[instrument(name = "PgMarketStore::insert_product", skip(self, draft), fields(name = %draft.name))]
  async fn insert_product(&self, owner: UserId, draft: &ProductDraft) -> MarketResult<Product> {
    let sql = format!(
      "INSERT INTO products (user_id, name, price, image_url, stock, condition, tags, is_purchasable) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PRODUCT_COLUMNS}"
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(owner)
      .bind(&draft.name)
      .bind(draft.price)
      .bind(&draft.image_url)
      .bind(draft.stock)
      .bind(draft.condition)
      .bind(&draft.tags)
      .bind(draft.is_purchasable)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_product_write(e, &draft.name))
  }

  #[instrument(name = "PgMarketStore::update_product", skip(self, draft))]
  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> MarketResult<Product> {
    let sql = format!(
      "UPDATE products SET name = $1, price = $2, image_url = $3, stock = $4, condition = $5, tags = $6, \
       is_purchasable = $7, updated_at = now() WHERE id = $8 RETURNING {PRODUCT_COLUMNS}"
    );
    sqlx::query_as::<_, Product>(&sql)
      .bind(&draft.name)
      .bind(draft.price)
      .bind(&draft.image_url)
      .bind(draft.stock)
      .bind(draft.condition)
      .bind(&draft.tags)
      .bind(draft.is_purchasable)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| map_product_write(e, &draft.name))?
      .ok_or_else(|| MarketError::not_found("product", id))
  }

  #[instrument(name = "PgMarketStore::set_stock", skip(self))]
  async fn set_stock(&self, id: ProductId, stock: i64) -> MarketResult<Product> {
    let sql = format!("UPDATE products SET stock = $1, updated_at = now() WHERE id = $2 RETURNING {PRODUCT_COLUMNS}");
    sqlx::query_as::<_, Product>(&sql)
      .bind(stock)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| MarketError::not_found("product", id))
  }

  #[instrument(name = "PgMarketStore::delete_product", skip(self))]
  async fn delete_product(&self, id: ProductId) -> MarketResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    if result.rows_affected() == 0 {
      return Err(MarketError::not_found("product", id));
    }
    Ok(())
  }

  async fn find_product(&self, id: ProductId) -> MarketResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  #[instrument(name = "PgMarketStore::fetch_products", skip_all)]
  async fn fetch_products(&self, query: &ListingQuery) -> MarketResult<Vec<Product>> {
    let mut qb = query.fetch_sql();
    Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
  }

  #[instrument(name = "PgMarketStore::count_products", skip_all)]
  async fn count_products(&self, query: &ListingQuery) -> MarketResult<i64> {
    let mut qb = query.count_sql();
    Ok(qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?)
  }

  async fn total_sold_by_owner(&self, owner: UserId) -> MarketResult<i64> {
    Ok(
      sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(purchase_count), 0)::BIGINT FROM products WHERE user_id = $1")
        .bind(owner)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn find_payment(&self, id: Uuid) -> MarketResult<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    Ok(
      sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn begin_purchase(&self) -> MarketResult<Box<dyn PurchaseTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgPurchaseTx { tx }))
  }
}

/// Wraps a live `sqlx` transaction. Dropping it un-committed rolls back.
pub struct PgPurchaseTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PurchaseTx for PgPurchaseTx {
  async fn lock_product(&mut self, id: ProductId) -> MarketResult<Option<LockedProduct>> {
    Ok(
      sqlx::query_as::<_, LockedProduct>(
        "SELECT id, name, image_url, price, stock FROM products WHERE id = $1 FOR UPDATE",
      )
      .bind(id)
      .fetch_optional(&mut *self.tx)
      .await?,
    )
  }

  async fn record_sale(&mut self, id: ProductId, quantity: i64) -> MarketResult<()> {
    let result = sqlx::query(
      "UPDATE products SET stock = stock - $1, purchase_count = purchase_count + $1, updated_at = now() \
       WHERE id = $2",
    )
    .bind(quantity)
    .bind(id)
    .execute(&mut *self.tx)
    .await?;
    if result.rows_affected() != 1 {
      return Err(MarketError::Internal(format!(
        "sale on product {} touched {} rows",
        id,
        result.rows_affected()
      )));
    }
    Ok(())
  }

  async fn insert_payment(&mut self, draft: &PaymentDraft) -> MarketResult<Payment> {
    let sql = format!(
      "INSERT INTO payments (product_id, bank_account_id, quantity, payment_proof_image_url, \
       product_name, product_image_url, product_price, seller_id, seller_username, seller_name, \
       buyer_id, buyer_username, buyer_name, bank_name, bank_account_name, bank_account_number) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
       RETURNING {PAYMENT_COLUMNS}"
    );
    Ok(
      sqlx::query_as::<_, Payment>(&sql)
        .bind(draft.product_id)
        .bind(draft.bank_account_id)
        .bind(draft.quantity)
        .bind(&draft.payment_proof_image_url)
        .bind(&draft.product_name)
        .bind(&draft.product_image_url)
        .bind(draft.product_price)
        .bind(draft.seller_id)
        .bind(&draft.seller_username)
        .bind(&draft.seller_name)
        .bind(draft.buyer_id)
        .bind(&draft.buyer_username)
        .bind(&draft.buyer_name)
        .bind(&draft.bank_name)
        .bind(&draft.bank_account_name)
        .bind(&draft.bank_account_number)
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn commit(self: Box<Self>) -> MarketResult<()> {
    Ok(self.tx.commit().await?)
  }

  async fn rollback(self: Box<Self>) -> MarketResult<()> {
    Ok(self.tx.rollback().await?)
  }
}

#[async_trait]
impl AccountDirectory for PgMarketStore {
  async fn find_user(&self, id: UserId) -> MarketResult<Option<UserIdentity>> {
    Ok(
      sqlx::query_as::<_, UserIdentity>("SELECT id, username, name FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_bank_account(&self, id: BankAccountId) -> MarketResult<Option<BankAccount>> {
    Ok(
      sqlx::query_as::<_, BankAccount>(
        "SELECT id, user_id, bank_name, bank_account_name, bank_account_number FROM banks WHERE id = $1",
      )
      .bind(id)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn bank_accounts_of(&self, owner: UserId) -> MarketResult<Vec<BankAccount>> {
    Ok(
      sqlx::query_as::<_, BankAccount>(
        "SELECT id, user_id, bank_name, bank_account_name, bank_account_number FROM banks \
         WHERE user_id = $1 ORDER BY id",
      )
      .bind(owner)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}
