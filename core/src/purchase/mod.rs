// bazaar/src/purchase/mod.rs

//! The purchase transaction: resolve the seller's bank account, lock the
//! product row, check and decrement stock, and write the receipt, all inside
//! one store transaction.

mod context;
pub mod engine;
pub mod request;

pub use engine::PurchaseEngine;
pub use request::BuyRequest;
