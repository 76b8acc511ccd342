//! Catalog reads: price resolution and the product filter engine.
//!
//! Everything here is pure. Persistence is reached through
//! [`crate::db::CatalogStore`]; the service wrapper lives in
//! [`crate::services::catalog`].

pub mod filter;
pub mod pricing;

pub use filter::{
    FilterError, Page, PageRequest, Pagination, PriceBucket, ProductFilter, Sort, SortField, normalize_origin,
};
pub use pricing::effective_price;
