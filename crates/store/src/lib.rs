//! Persistence for accounts, catalog data, orders and order items.
//!
//! [`ShopStore`] is the capability the order engine depends on. Two
//! implementations ship here: [`InMemoryStore`] for tests and local runs, and
//! [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{DEFAULT_LIMIT, OrderQuery, Page, ProductQuery};
pub use store::{CatalogWriter, ShopStore};
