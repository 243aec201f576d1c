use async_trait::async_trait;
use common::{
    Address, AddressId, Brand, BrandId, Category, CategoryId, ItemStatus, Money, Order, OrderId,
    OrderItem, OrderItemId, OrderStatus, Product, ProductId, User, UserId,
};

use crate::{OrderQuery, Page, ProductQuery, Result};

/// Storage capability consumed by the order engine and the listing façade.
///
/// Lookups return `Ok(None)` (or an empty list) when nothing matches;
/// `Err` is reserved for storage failures. Owner-scoped lookups treat a
/// record owned by someone else exactly like a missing one.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Fetches a user account.
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Fetches an address only if it belongs to `owner`.
    async fn find_address(&self, id: AddressId, owner: UserId) -> Result<Option<Address>>;

    /// Fetches a single product.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches every listed product in one read.
    ///
    /// Missing ids are simply absent from the result; order is unspecified.
    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>>;

    /// Lists all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Lists all brands ordered by name.
    async fn list_brands(&self) -> Result<Vec<Brand>>;

    /// Lists products matching a query, ordered by name.
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>>;

    /// Persists an order together with all of its items as one unit.
    async fn create_order(&self, order: &Order) -> Result<()>;

    /// Fetches an order (with items) only if it belongs to `owner`.
    async fn find_order(&self, id: OrderId, owner: UserId) -> Result<Option<Order>>;

    /// Lists a customer's orders (with items), newest first.
    async fn list_orders(&self, owner: UserId, query: &OrderQuery) -> Result<Page<Order>>;

    /// Sets an order's aggregate status. Returns false if no row was updated.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Sets the status of every item of an order. Returns the number of items updated.
    async fn update_order_items_status(&self, order_id: OrderId, status: ItemStatus)
    -> Result<u64>;

    /// Fetches an order item only if it is fulfilled by `merchant`.
    async fn find_order_item(
        &self,
        id: OrderItemId,
        merchant: UserId,
    ) -> Result<Option<OrderItem>>;

    /// Fetches the items of one order that are fulfilled by `merchant`.
    async fn find_order_items(&self, order_id: OrderId, merchant: UserId)
    -> Result<Vec<OrderItem>>;

    /// Lists a merchant's order items, newest first.
    async fn list_order_items(
        &self,
        merchant: UserId,
        query: &OrderQuery,
    ) -> Result<Page<OrderItem>>;

    /// Sets a single item's status. Returns false if no row was updated.
    async fn update_order_item_status(&self, id: OrderItemId, status: ItemStatus)
    -> Result<bool>;
}

/// Write access to accounts and catalog reference data.
///
/// Account signup and catalog management live outside the order core; this
/// trait lets bootstrap code and tests populate a store.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Inserts a user. Duplicate email or phone is a `Conflict`.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn insert_address(&self, address: &Address) -> Result<()>;

    /// Inserts a category. Duplicate names are a `Conflict`.
    async fn insert_category(&self, category: &Category) -> Result<()>;

    /// Inserts a brand. Duplicate names are a `Conflict`.
    async fn insert_brand(&self, brand: &Brand) -> Result<()>;

    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Reprices a product. Returns false if the product does not exist.
    async fn update_product_price(&self, id: ProductId, price: Money) -> Result<bool>;
}
