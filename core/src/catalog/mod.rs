// bazaar/src/catalog/mod.rs

//! Seller-side catalog operations and the read paths (detail, listing).

pub mod service;

pub use service::{CatalogService, ProductDetail, ProductPage, SellerSummary};
