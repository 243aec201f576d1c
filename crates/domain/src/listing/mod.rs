//! Product and order listings for customers, merchants and the public.

mod filter;
mod service;

pub use filter::{ListingParams, NumericFilter, OrderFilter, Pagination, ProductFilter};
pub use service::{CatalogService, OrderListing};
