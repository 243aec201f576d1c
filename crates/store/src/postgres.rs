use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use common::{
    Address, AddressId, Brand, BrandId, Category, CategoryId, ItemStatus, Money, Order, OrderId,
    OrderItem, OrderItemId, OrderStatus, Product, ProductId, UnknownVariant, User, UserId,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::{CatalogWriter, OrderQuery, Page, ProductQuery, Result, StoreError, store::ShopStore};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, password_hash, role, is_verified, created_at";

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.category_id, p.brand_id, p.merchant_id, \
     p.price_cents, p.rating, p.is_approved, p.created_at";

const ORDER_COLUMNS: &str =
    "id, user_id, address_id, name, email, phone, total_amount_cents, status, created_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, merchant_id, customer_id, address_id, \
     product_name, quantity, price_cents, status, created_at";

/// PostgreSQL-backed shop store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and wraps it.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password_hash: row.try_get("password_hash")?,
            role: parse_column(&row, "role")?,
            is_verified: row.try_get("is_verified")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_address(row: PgRow) -> Result<Address> {
        Ok(Address {
            id: AddressId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            door_no: row.try_get("door_no")?,
            street: row.try_get("street")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            zip_code: row.try_get("zip_code")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            brand_id: BrandId::from_uuid(row.try_get::<Uuid, _>("brand_id")?),
            merchant_id: UserId::from_uuid(row.try_get::<Uuid, _>("merchant_id")?),
            price: Money::from_cents(row.try_get("price_cents")?),
            rating: row.try_get("rating")?,
            is_approved: row.try_get("is_approved")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Maps an order row; items are attached by the caller.
    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            address_id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            items: Vec::new(),
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: parse_column(&row, "status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("quantity out of range: {quantity}")))?;

        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            merchant_id: UserId::from_uuid(row.try_get::<Uuid, _>("merchant_id")?),
            customer_id: UserId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            address_id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            product_name: row.try_get("product_name")?,
            quantity,
            price: Money::from_cents(row.try_get("price_cents")?),
            status: parse_column(&row, "status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Loads the items of several orders in one query and attaches them.
    async fn attach_items(&self, orders: &mut [Order]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, line_no"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = Self::row_to_item(row)?;
            by_order.entry(item.order_id).or_default().push(item);
        }

        for order in orders.iter_mut() {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }
}

/// Parses a text column into one of the shared enums.
fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let text: String = row.try_get(column)?;
    text.parse()
        .map_err(|e: UnknownVariant| StoreError::Corrupt(e.to_string()))
}

/// Turns a unique violation into a `Conflict`; anything else stays a database error.
fn map_unique_violation(e: sqlx::Error, entity: &'static str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict {
            entity,
            detail: db_err.constraint().unwrap_or("unique key").to_string(),
        };
    }
    StoreError::Database(e)
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    qb.push(
        " FROM products p \
         JOIN categories c ON c.id = p.category_id \
         JOIN brands b ON b.id = p.brand_id \
         WHERE TRUE",
    );

    if let Some(merchant) = query.merchant_id {
        qb.push(" AND p.merchant_id = ").push_bind(merchant.as_uuid());
    }
    if let Some(category) = &query.category_name {
        qb.push(" AND LOWER(c.name) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(brand) = &query.brand_name {
        qb.push(" AND LOWER(b.name) = LOWER(")
            .push_bind(brand.clone())
            .push(")");
    }
    if let Some(max_price) = query.max_price {
        qb.push(" AND p.price_cents <= ").push_bind(max_price.cents());
    }
    if let Some(min_rating) = query.min_rating {
        qb.push(" AND p.rating >= ").push_bind(min_rating);
    }
}

fn push_window_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    owner_column: &str,
    owner: UserId,
    query: &OrderQuery,
) {
    qb.push(" WHERE ")
        .push(owner_column)
        .push(" = ")
        .push_bind(owner.as_uuid());

    if let Some(from) = query.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
}

/// Binds the page window. Values past `i64::MAX` saturate, which selects
/// the same rows.
fn push_window(qb: &mut QueryBuilder<'_, Postgres>, limit: usize, offset: usize) {
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

#[async_trait]
impl ShopStore for PostgresStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_address(&self, id: AddressId, owner: UserId) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, door_no, street, city, state, zip_code
            FROM addresses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_address).transpose()
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Category {
                id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>> {
        let row = sqlx::query("SELECT id, name FROM brands WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(Brand {
                id: BrandId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_brands(&self) -> Result<Vec<Brand>> {
        let rows = sqlx::query("SELECT id, name FROM brands ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Brand {
                    id: BrandId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_product_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS}"));
        push_product_filters(&mut select, query);
        select.push(" ORDER BY p.name ASC, p.id ASC");
        push_window(&mut select, query.limit, query.offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            limit: query.limit,
            offset: query.offset,
        })
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, items = order.items.len()))]
    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, address_id, name, email, phone, total_amount_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.address_id.as_uuid())
        .bind(&order.name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "order"))?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, merchant_id, customer_id, address_id,
                                         product_name, line_no, quantity, price_cents, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.merchant_id.as_uuid())
            .bind(item.customer_id.as_uuid())
            .bind(item.address_id.as_uuid())
            .bind(&item.product_name)
            .bind(line_no as i32)
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .bind(item.status.as_str())
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "order item"))?;
        }

        // Dropping the transaction without commit rolls every insert back.
        tx.commit().await?;
        tracing::debug!("order committed");
        Ok(())
    }

    async fn find_order(&self, id: OrderId, owner: UserId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut orders = [Self::row_to_order(row)?];
        self.attach_items(&mut orders).await?;
        let [order] = orders;
        Ok(Some(order))
    }

    async fn list_orders(&self, owner: UserId, query: &OrderQuery) -> Result<Page<Order>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_window_filters(&mut count, "user_id", owner, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_window_filters(&mut select, "user_id", owner, query);
        select.push(" ORDER BY created_at DESC, id ASC");
        push_window(&mut select, query.limit, query.offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let mut items = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        self.attach_items(&mut items).await?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_order_items_status(
        &self,
        order_id: OrderId,
        status: ItemStatus,
    ) -> Result<u64> {
        let result = sqlx::query("UPDATE order_items SET status = $2 WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_order_item(
        &self,
        id: OrderItemId,
        merchant: UserId,
    ) -> Result<Option<OrderItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1 AND merchant_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(merchant.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn find_order_items(
        &self,
        order_id: OrderId,
        merchant: UserId,
    ) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 AND merchant_id = $2 ORDER BY line_no"
        ))
        .bind(order_id.as_uuid())
        .bind(merchant.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn list_order_items(
        &self,
        merchant: UserId,
        query: &OrderQuery,
    ) -> Result<Page<OrderItem>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM order_items");
        push_window_filters(&mut count, "merchant_id", merchant, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {ITEM_COLUMNS} FROM order_items"));
        push_window_filters(&mut select, "merchant_id", merchant, query);
        select.push(" ORDER BY created_at DESC, order_id ASC, line_no ASC");
        push_window(&mut select, query.limit, query.offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_order_item_status(&self, id: OrderItemId, status: ItemStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE order_items SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CatalogWriter for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, phone, password_hash, role, is_verified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "user"))?;

        Ok(())
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, door_no, street, city, state, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.user_id.as_uuid())
        .bind(&address.door_no)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "address"))?;

        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "category"))?;

        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> Result<()> {
        sqlx::query("INSERT INTO brands (id, name) VALUES ($1, $2)")
            .bind(brand.id.as_uuid())
            .bind(&brand.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "brand"))?;

        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category_id, brand_id, merchant_id, price_cents, rating, is_approved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.category_id.as_uuid())
        .bind(product.brand_id.as_uuid())
        .bind(product.merchant_id.as_uuid())
        .bind(product.price.cents())
        .bind(product.rating)
        .bind(product.is_approved)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product"))?;

        Ok(())
    }

    async fn update_product_price(&self, id: ProductId, price: Money) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET price_cents = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(price.cents())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
