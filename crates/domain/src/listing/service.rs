//! Read-side façade over the store.

use common::{
    Brand, BrandId, Category, CategoryId, Order, OrderItem, Product, ProductId, Role, User, UserId,
};
use serde::Serialize;
use store::{Page, ShopStore};

use crate::actor::Actor;
use crate::authorization::require_role;
use crate::error::{Result, ShopError};

use super::{OrderFilter, ProductFilter};

/// What an order listing returns for the acting role.
///
/// Customers see whole orders. Merchants see the order items they fulfil.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderListing {
    Orders(Page<Order>),
    Items(Page<OrderItem>),
}

impl OrderListing {
    /// Rows matching the filter before pagination.
    pub fn total(&self) -> u64 {
        match self {
            OrderListing::Orders(page) => page.total,
            OrderListing::Items(page) => page.total,
        }
    }

    /// Rows in this page.
    pub fn len(&self) -> usize {
        match self {
            OrderListing::Orders(page) => page.items.len(),
            OrderListing::Items(page) => page.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Listings and single-record reads for products, catalog data, orders and
/// profiles.
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: ShopStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists products. With a `scope`, only that merchant's catalog is
    /// searched.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        scope: Option<UserId>,
    ) -> Result<Page<Product>> {
        Ok(self.store.list_products(&filter.to_query(scope)).await?)
    }

    /// Lists the acting merchant's own products.
    pub async fn list_merchant_products(
        &self,
        actor: Actor,
        filter: &ProductFilter,
    ) -> Result<Page<Product>> {
        require_role(&actor, Role::Merchant, "list merchant products")?;
        self.list_products(filter, Some(actor.id)).await
    }

    /// Lists the actor's orders, newest first.
    ///
    /// Customers get their orders with items, merchants get their order
    /// items. Admins have no order listing.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn list_orders(&self, actor: Actor, filter: &OrderFilter) -> Result<OrderListing> {
        let query = filter.to_query();
        match actor.role {
            Role::Customer => Ok(OrderListing::Orders(
                self.store.list_orders(actor.id, &query).await?,
            )),
            Role::Merchant => Ok(OrderListing::Items(
                self.store.list_order_items(actor.id, &query).await?,
            )),
            Role::Admin => Err(ShopError::Forbidden(
                "admins have no order listing".to_string(),
            )),
        }
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .find_product(id)
            .await?
            .ok_or(ShopError::ProductNotFound(id))
    }

    /// Loads a product from the acting merchant's catalog.
    ///
    /// Another merchant's product is reported as not found.
    pub async fn get_merchant_product(&self, actor: Actor, id: ProductId) -> Result<Product> {
        require_role(&actor, Role::Merchant, "view merchant product")?;

        self.store
            .find_product(id)
            .await?
            .filter(|product| product.merchant_id == actor.id)
            .ok_or(ShopError::ProductNotFound(id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn list_brands(&self) -> Result<Vec<Brand>> {
        Ok(self.store.list_brands().await?)
    }

    pub async fn find_category(&self, id: CategoryId) -> Result<Category> {
        self.store
            .find_category(id)
            .await?
            .ok_or(ShopError::CategoryNotFound(id))
    }

    pub async fn find_brand(&self, id: BrandId) -> Result<Brand> {
        self.store
            .find_brand(id)
            .await?
            .ok_or(ShopError::BrandNotFound(id))
    }

    /// Loads the actor's own user record.
    pub async fn get_profile(&self, actor: Actor) -> Result<User> {
        self.store
            .find_user(actor.id)
            .await?
            .ok_or(ShopError::UserNotFound(actor.id))
    }
}
