//! Shared vocabulary for the shop backend: identifiers, money, roles,
//! fulfillment statuses and the persistent records.

pub mod ids;
pub mod models;
pub mod money;
pub mod role;
pub mod status;

pub use ids::{AddressId, BrandId, CategoryId, OrderId, OrderItemId, ProductId, UserId};
pub use models::{Address, Brand, Category, Order, OrderItem, Product, User};
pub use money::{Money, ParseMoneyError};
pub use role::Role;
pub use status::{ItemStatus, OrderStatus, UnknownVariant};
