use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    Address, AddressId, Brand, BrandId, Category, CategoryId, ItemStatus, Money, Order, OrderId,
    OrderItem, OrderItemId, OrderStatus, Product, ProductId, User, UserId,
};
use tokio::sync::RwLock;

use crate::{
    CatalogWriter, OrderQuery, Page, ProductQuery, Result, StoreError, store::ShopStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    addresses: HashMap<AddressId, Address>,
    categories: HashMap<CategoryId, Category>,
    brands: HashMap<BrandId, Brand>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

impl Tables {
    fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories.get(&id).map(|c| c.name.as_str())
    }

    fn brand_name(&self, id: BrandId) -> Option<&str> {
        self.brands.get(&id).map(|b| b.name.as_str())
    }

    fn items(&self) -> impl Iterator<Item = &OrderItem> {
        self.orders.values().flat_map(|o| o.items.iter())
    }

    fn items_mut(&mut self) -> impl Iterator<Item = &mut OrderItem> {
        self.orders.values_mut().flat_map(|o| o.items.iter_mut())
    }
}

fn name_matches(filter: Option<&str>, actual: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(wanted) => actual.is_some_and(|name| name.eq_ignore_ascii_case(wanted)),
    }
}

/// In-memory store implementation for testing and local development.
///
/// Provides the same interface and ownership rules as the PostgreSQL
/// implementation. Every trait call takes the lock once, so each call is
/// atomic with respect to the others.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the total number of order items stored.
    pub async fn order_item_count(&self) -> usize {
        self.tables.read().await.items().count()
    }

    /// Removes every record.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl ShopStore for InMemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_address(&self, id: AddressId, owner: UserId) -> Result<Option<Address>> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .get(&id)
            .filter(|a| a.user_id == owner)
            .cloned())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>> {
        Ok(self.tables.read().await.brands.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<_> = self
            .tables
            .read()
            .await
            .categories
            .values()
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_brands(&self) -> Result<Vec<Brand>> {
        let mut brands: Vec<_> = self.tables.read().await.brands.values().cloned().collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| {
                if let Some(merchant) = query.merchant_id
                    && p.merchant_id != merchant
                {
                    return false;
                }
                if !name_matches(
                    query.category_name.as_deref(),
                    tables.category_name(p.category_id),
                ) {
                    return false;
                }
                if !name_matches(query.brand_name.as_deref(), tables.brand_name(p.brand_id)) {
                    return false;
                }
                if let Some(max) = query.max_price
                    && p.price > max
                {
                    return false;
                }
                if let Some(min) = query.min_rating
                    && p.rating < min
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(Page::slice(products, query.limit, query.offset))
    }

    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict {
                entity: "order",
                detail: order.id.to_string(),
            });
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order(&self, id: OrderId, owner: UserId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .get(&id)
            .filter(|o| o.user_id == owner)
            .cloned())
    }

    async fn list_orders(&self, owner: UserId, query: &OrderQuery) -> Result<Page<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.user_id == owner && query.matches(o.created_at))
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(Page::slice(orders, query.limit, query.offset))
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_order_items_status(
        &self,
        order_id: OrderId,
        status: ItemStatus,
    ) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&order_id) else {
            return Ok(0);
        };
        for item in &mut order.items {
            item.status = status;
        }
        Ok(order.items.len() as u64)
    }

    async fn find_order_item(
        &self,
        id: OrderItemId,
        merchant: UserId,
    ) -> Result<Option<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items()
            .find(|i| i.id == id && i.merchant_id == merchant)
            .cloned())
    }

    async fn find_order_items(
        &self,
        order_id: OrderId,
        merchant: UserId,
    ) -> Result<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .get(&order_id)
            .map(|o| {
                o.items
                    .iter()
                    .filter(|i| i.merchant_id == merchant)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_order_items(
        &self,
        merchant: UserId,
        query: &OrderQuery,
    ) -> Result<Page<OrderItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .items()
            .filter(|i| i.merchant_id == merchant && query.matches(i.created_at))
            .cloned()
            .collect();

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(Page::slice(items, query.limit, query.offset))
    }

    async fn update_order_item_status(&self, id: OrderItemId, status: ItemStatus) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.items_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CatalogWriter for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(&user.email) || u.phone == user.phone)
        {
            let detail = if existing.email.eq_ignore_ascii_case(&user.email) {
                format!("email {}", user.email)
            } else {
                format!("phone {}", user.phone)
            };
            return Err(StoreError::Conflict {
                entity: "user",
                detail,
            });
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        self.tables
            .write()
            .await
            .addresses
            .insert(address.id, address.clone());
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(StoreError::Conflict {
                entity: "category",
                detail: category.name.clone(),
            });
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .brands
            .values()
            .any(|b| b.name.eq_ignore_ascii_case(&brand.name))
        {
            return Err(StoreError::Conflict {
                entity: "brand",
                detail: brand.name.clone(),
            });
        }
        tables.brands.insert(brand.id, brand.clone());
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.tables
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product_price(&self, id: ProductId, price: Money) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&id) {
            Some(product) => {
                product.price = price;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
