// bazaar/src/catalog/service.rs

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{MarketError, MarketResult};
use crate::filter::{FilterSpec, ListingQuery};
use crate::models::{BankAccount, Product, ProductDraft, ProductId, UserId};
use crate::store::{AccountDirectory, CatalogStore};
use crate::validation::require_non_negative;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerSummary {
  pub name: String,
  /// Units sold across every product the seller lists.
  pub product_sold_total: i64,
  pub bank_accounts: Vec<BankAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
  pub product: Product,
  pub seller: SellerSummary,
}

/// One page of a listing. `total` counts every match, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
  pub products: Vec<Product>,
  pub total: i64,
  pub limit: Option<i64>,
  pub offset: i64,
}

pub struct CatalogService {
  catalog: Arc<dyn CatalogStore>,
  accounts: Arc<dyn AccountDirectory>,
}

impl std::fmt::Debug for CatalogService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CatalogService").finish_non_exhaustive()
  }
}

impl CatalogService {
  pub fn new(catalog: Arc<dyn CatalogStore>, accounts: Arc<dyn AccountDirectory>) -> Self {
    Self { catalog, accounts }
  }

  /// Loads the product and checks that `caller` owns it.
  async fn owned_product(&self, caller: UserId, product_id: ProductId) -> MarketResult<Product> {
    let product = self
      .catalog
      .find_product(product_id)
      .await?
      .ok_or_else(|| MarketError::not_found("product", product_id))?;
    if product.owner_id != caller {
      return Err(MarketError::forbidden("product", product_id));
    }
    Ok(product)
  }

  #[instrument(name = "CatalogService::create_product", skip(self, draft), fields(name = %draft.name))]
  pub async fn create_product(&self, owner: UserId, draft: ProductDraft) -> MarketResult<Product> {
    draft.validate()?;
    if self.accounts.find_user(owner).await?.is_none() {
      return Err(MarketError::Unauthorized);
    }
    let product = self.catalog.insert_product(owner, &draft).await?;
    debug!(product_id = product.id, "Product created.");
    Ok(product)
  }

  #[instrument(name = "CatalogService::update_product", skip(self, draft))]
  pub async fn update_product(
    &self,
    caller: UserId,
    product_id: ProductId,
    draft: ProductDraft,
  ) -> MarketResult<Product> {
    draft.validate()?;
    self.owned_product(caller, product_id).await?;
    self.catalog.update_product(product_id, &draft).await
  }

  #[instrument(name = "CatalogService::set_stock", skip(self))]
  pub async fn set_stock(&self, caller: UserId, product_id: ProductId, stock: i64) -> MarketResult<Product> {
    require_non_negative("stock", stock)?;
    self.owned_product(caller, product_id).await?;
    self.catalog.set_stock(product_id, stock).await
  }

  /// Receipts that mention the product are kept.
  #[instrument(name = "CatalogService::delete_product", skip(self))]
  pub async fn delete_product(&self, caller: UserId, product_id: ProductId) -> MarketResult<()> {
    self.owned_product(caller, product_id).await?;
    self.catalog.delete_product(product_id).await
  }

  #[instrument(name = "CatalogService::product_detail", skip(self))]
  pub async fn product_detail(&self, product_id: ProductId) -> MarketResult<ProductDetail> {
    let product = self
      .catalog
      .find_product(product_id)
      .await?
      .ok_or_else(|| MarketError::not_found("product", product_id))?;
    let seller = self
      .accounts
      .find_user(product.owner_id)
      .await?
      .ok_or_else(|| MarketError::not_found("seller", product.owner_id))?;
    let product_sold_total = self.catalog.total_sold_by_owner(seller.id).await?;
    let bank_accounts = self.accounts.bank_accounts_of(seller.id).await?;

    Ok(ProductDetail {
      product,
      seller: SellerSummary {
        name: seller.name,
        product_sold_total,
        bank_accounts,
      },
    })
  }

  /// Fetch and count run from one compiled query so `total` always agrees
  /// with the rows an unpaged fetch would return.
  #[instrument(name = "CatalogService::list_products", skip(self, spec))]
  pub async fn list_products(&self, spec: &FilterSpec, caller: Option<UserId>) -> MarketResult<ProductPage> {
    let query = ListingQuery::compile(spec, caller);
    debug!(predicates = query.predicates.len(), sorted = query.order.is_some(), "Listing compiled.");
    let products = self.catalog.fetch_products(&query).await?;
    let total = self.catalog.count_products(&query).await?;
    Ok(ProductPage {
      products,
      total,
      limit: query.page.limit,
      offset: query.page.offset,
    })
  }
}
