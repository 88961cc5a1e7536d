// bazaar/src/filter/mod.rs

//! Listing filters. A [`FilterSpec`] describes what the caller asked for;
//! [`ListingQuery::compile`] turns it into typed predicates, an optional sort
//! order and a page, which render to SQL (`sql`) or evaluate in memory.
//! Both the row fetch and the total count are built from the same predicate
//! list, so the reported total always matches what an unpaged fetch returns.

pub mod query;
pub mod spec;
pub mod sql;

pub use query::{ListingQuery, Page, Predicate, SortOrder};
pub use spec::{FilterSpec, SortDirection, SortKey};
