// bazaar/src/models/mod.rs

//! Entities persisted by the stores.

pub mod account;
pub mod payment;
pub mod product;

pub use account::{BankAccount, UserIdentity};
pub use payment::{Payment, PaymentDraft};
pub use product::{LockedProduct, Product, ProductCondition, ProductDraft};

pub type UserId = i64;
pub type ProductId = i64;
pub type BankAccountId = i64;
