// bazaar/src/lib.rs

//! Bazaar: the transactional core of a marketplace backend.
//!
//!  - [`PurchaseEngine`] buys N units of a product against a seller's bank
//!    account. Stock check, decrement and receipt happen in one store
//!    transaction under a product row lock, so concurrent buyers never oversell.
//!  - [`CatalogService`] covers seller mutations, product detail and the
//!    filtered, sorted, paginated listing built by the [`filter`] compiler.
//!  - [`store`] defines the storage seams with PostgreSQL and in-memory
//!    implementations.
//!
//! The purchase sequence is declared as named steps on the small
//! [`workflow`] pipeline.

pub mod catalog;
pub mod error;
pub mod filter;
pub mod models;
pub mod purchase;
pub mod store;
pub mod validation;
pub mod workflow;

pub use crate::catalog::{CatalogService, ProductDetail, ProductPage, SellerSummary};
pub use crate::error::{MarketError, MarketResult};
pub use crate::filter::{FilterSpec, ListingQuery, SortDirection, SortKey};
pub use crate::models::{BankAccount, Payment, Product, ProductCondition, ProductDraft, UserIdentity};
pub use crate::purchase::{BuyRequest, PurchaseEngine};
pub use crate::store::{AccountDirectory, CatalogStore, MemoryMarketStore, PgMarketStore, PurchaseTx};
pub use crate::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, WorkflowError};
