//! Core of the shop backend.
//!
//! This crate provides:
//! - [`Actor`], the authenticated caller passed into every operation
//! - the fulfillment authorization table ([`authorization`])
//! - [`OrderService`], which creates orders and applies status transitions
//! - [`CatalogService`] and the listing filters, which turn raw query
//!   parameters into store queries
//! - [`ShopError`] and its abstract [`ErrorKind`]

pub mod actor;
pub mod authorization;
pub mod error;
pub mod listing;
pub mod order;

pub use actor::Actor;
pub use authorization::{
    RequestedTransition, authorize, authorize_item, authorize_order, is_allowed, require_role,
};
pub use error::{ErrorKind, Result, ShopError};
pub use listing::{
    CatalogService, ListingParams, NumericFilter, OrderFilter, OrderListing, Pagination,
    ProductFilter,
};
pub use order::{LineRequest, OrderRequest, OrderService};
