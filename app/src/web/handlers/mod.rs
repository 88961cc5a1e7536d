// bazaar/app/src/web/handlers/mod.rs

pub mod product_handlers;
pub mod purchase_handlers;
