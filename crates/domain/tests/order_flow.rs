//! Integration tests for the order engine and the listing façade.
//!
//! These run against the in-memory store and cover the full order
//! lifecycle: creation, snapshots, cancellation cascade, merchant shipping
//! and the listings built on top.

use chrono::{Duration, Utc};
use common::{
    Address, AddressId, Brand, BrandId, Category, CategoryId, ItemStatus, Money, OrderStatus,
    Product, ProductId, Role, User, UserId,
};
use domain::{
    Actor, CatalogService, ErrorKind, ListingParams, OrderFilter, OrderListing, OrderRequest,
    OrderService, Pagination, ProductFilter, ShopError,
};
use store::{CatalogWriter, InMemoryStore, ShopStore};

/// A store with one customer (and address), two merchants and a few products.
struct Fixture {
    store: InMemoryStore,
    orders: OrderService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    customer: Actor,
    address: AddressId,
    merchant: Actor,
    other_merchant: Actor,
    /// Priced 10.00, sold by `merchant`.
    p: Product,
    /// Priced 5.00, sold by `other_merchant`.
    q: Product,
}

fn user(role: Role, first: &str) -> User {
    User {
        id: UserId::new(),
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}@example.com", first.to_lowercase()),
        phone: format!("555-{first}"),
        password_hash: "hash".to_string(),
        role,
        is_verified: true,
        created_at: Utc::now(),
    }
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();

    let customer = user(Role::Customer, "Carol");
    let merchant = user(Role::Merchant, "Mallory");
    let other_merchant = user(Role::Merchant, "Oscar");
    for u in [&customer, &merchant, &other_merchant] {
        store.insert_user(u).await.unwrap();
    }

    let address = Address {
        id: AddressId::new(),
        user_id: customer.id,
        door_no: "7".to_string(),
        street: "Elm St".to_string(),
        city: "Portland".to_string(),
        state: "OR".to_string(),
        zip_code: "97201".to_string(),
    };
    store.insert_address(&address).await.unwrap();

    let category = Category {
        id: CategoryId::new(),
        name: "Kitchen".to_string(),
    };
    let brand = Brand {
        id: BrandId::new(),
        name: "Forge".to_string(),
    };
    store.insert_category(&category).await.unwrap();
    store.insert_brand(&brand).await.unwrap();

    let product = |name: &str, cents: i64, merchant_id: UserId| Product {
        id: ProductId::new(),
        name: name.to_string(),
        category_id: category.id,
        brand_id: brand.id,
        merchant_id,
        price: Money::from_cents(cents),
        rating: 4.0,
        is_approved: true,
        created_at: Utc::now(),
    };
    let p = product("Pan", 1_000, merchant.id);
    let q = product("Quill", 500, other_merchant.id);
    store.insert_product(&p).await.unwrap();
    store.insert_product(&q).await.unwrap();

    Fixture {
        orders: OrderService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        store,
        customer: Actor::customer(customer.id),
        address: address.id,
        merchant: Actor::merchant(merchant.id),
        other_merchant: Actor::merchant(other_merchant.id),
        p,
        q,
    }
}

impl Fixture {
    fn standard_request(&self) -> OrderRequest {
        OrderRequest::new(self.address)
            .line(self.p.id, 2)
            .line(self.q.id, 1)
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn two_products_total_twenty_five() {
        let f = fixture().await;

        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        assert_eq!(order.total_amount, Money::from_cents(2_500));
        assert_eq!(order.total_amount.to_string(), "25.00");
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.status == ItemStatus::Placed));
        assert_eq!(order.user_id, f.customer.id);
        assert_eq!(order.address_id, f.address);
        assert_eq!(order.name, "Carol Tester");

        let stored = f
            .store
            .find_order(order.id, f.customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn items_snapshot_product_fields() {
        let f = fixture().await;

        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        let pan = &order.items[0];
        assert_eq!(pan.product_id, f.p.id);
        assert_eq!(pan.merchant_id, f.merchant.id);
        assert_eq!(pan.product_name, "Pan");
        assert_eq!(pan.price, Money::from_cents(1_000));
        assert_eq!(pan.customer_id, f.customer.id);
        assert_eq!(pan.address_id, f.address);
        assert_eq!(pan.order_id, order.id);
        assert_eq!(pan.created_at, order.created_at);
        assert_eq!(order.items[1].merchant_id, f.other_merchant.id);
    }

    #[tokio::test]
    async fn total_survives_later_price_changes() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        f.store
            .update_product_price(f.p.id, Money::from_cents(99_900))
            .await
            .unwrap();

        let reloaded = f.orders.get_order(f.customer, order.id).await.unwrap();
        assert_eq!(reloaded.total_amount, Money::from_cents(2_500));
        assert_eq!(reloaded.items[0].price, Money::from_cents(1_000));
        assert_eq!(Some(reloaded.total_amount), reloaded.items_total());

        // New orders pick up the new price.
        let next = f
            .orders
            .create_order(f.customer, OrderRequest::new(f.address).line(f.p.id, 1))
            .await
            .unwrap();
        assert_eq!(next.total_amount, Money::from_cents(99_900));
    }

    #[tokio::test]
    async fn another_users_address_creates_nothing() {
        let f = fixture().await;

        // The merchant owns no address; give them a customer-role actor to reach
        // the address check.
        let stranger = Actor::customer(f.merchant.id);
        let err = f
            .orders
            .create_order(stranger, f.standard_request())
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::AddressNotOwned(id) if id == f.address));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_product_aborts_whole_order() {
        let f = fixture().await;
        let missing = ProductId::new();

        let err = f
            .orders
            .create_order(
                f.customer,
                OrderRequest::new(f.address)
                    .line(f.p.id, 1)
                    .line(missing, 1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::ProductNotFound(id) if id == missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.order_item_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_stay_separate() {
        let f = fixture().await;

        let order = f
            .orders
            .create_order(
                f.customer,
                OrderRequest::new(f.address)
                    .line(f.p.id, 1)
                    .line(f.p.id, 2),
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_ne!(order.items[0].id, order.items[1].id);
        assert_eq!(order.total_amount, Money::from_cents(3_000));
    }

    #[tokio::test]
    async fn orders_are_independent() {
        let f = fixture().await;

        let first = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();
        let second = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(f.store.order_count().await, 2);
        assert_eq!(f.store.order_item_count().await, 4);
    }
}

mod status_transitions {
    use super::*;

    #[tokio::test]
    async fn cancel_cascades_to_every_item() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        // One item already moved on before the cancellation.
        f.orders
            .update_order_item_status(f.merchant, order.items[0].id, ItemStatus::Shipped)
            .await
            .unwrap();

        f.orders
            .update_order_status(f.customer, order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let reloaded = f.orders.get_order(f.customer, order.id).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert!(
            reloaded
                .items
                .iter()
                .all(|i| i.status == ItemStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn customer_may_only_request_cancelled() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        for requested in [
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Delivered,
        ] {
            let err = f
                .orders
                .update_order_status(f.customer, order.id, requested)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden, "{requested}");
        }

        let reloaded = f.orders.get_order(f.customer, order.id).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn cancelling_someone_elses_order_is_not_found() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        let err = f
            .orders
            .cancel_order(Actor::customer(UserId::new()), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn merchant_ships_only_own_items() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();
        let (pan, quill) = (&order.items[0], &order.items[1]);

        let err = f
            .orders
            .update_order_item_status(f.merchant, quill.id, ItemStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::OrderItemNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.orders
            .update_order_item_status(f.merchant, pan.id, ItemStatus::Shipped)
            .await
            .unwrap();

        let reloaded = f.orders.get_order(f.customer, order.id).await.unwrap();
        assert_eq!(reloaded.items[0].status, ItemStatus::Shipped);
        assert_eq!(reloaded.items[1].status, ItemStatus::Placed);
        // Shipping never moves the parent order.
        assert_eq!(reloaded.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn merchant_may_only_request_shipped() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        for requested in [
            ItemStatus::Placed,
            ItemStatus::OutForDelivery,
            ItemStatus::Delivered,
            ItemStatus::Cancelled,
        ] {
            let err = f
                .orders
                .update_order_item_status(f.merchant, order.items[0].id, requested)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden, "{requested}");
        }
    }

    #[tokio::test]
    async fn shipping_twice_is_accepted() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        for _ in 0..2 {
            f.orders
                .update_order_item_status(f.merchant, order.items[0].id, ItemStatus::Shipped)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn customer_cannot_ship_and_merchant_cannot_cancel() {
        let f = fixture().await;
        let order = f
            .orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        let err = f
            .orders
            .update_order_item_status(f.customer, order.items[0].id, ItemStatus::Shipped)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = f
            .orders
            .update_order_status(f.merchant, order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}

mod listings {
    use super::*;

    #[tokio::test]
    async fn default_pagination_is_first_ten() {
        let pagination = Pagination::parse(Some(""), Some("")).unwrap();
        assert_eq!((pagination.limit, pagination.offset), (10, 0));

        let pagination = Pagination::parse(Some("5"), Some("2")).unwrap();
        assert_eq!((pagination.limit, pagination.offset), (5, 5));
    }

    #[tokio::test]
    async fn customer_orders_newest_first_with_total() {
        let f = fixture().await;
        let mut ids = Vec::new();
        for _ in 0..3 {
            let order = f
                .orders
                .create_order(f.customer, f.standard_request())
                .await
                .unwrap();
            ids.push(order.id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let filter = OrderFilter::from_params(&ListingParams {
            limit: Some("2".to_string()),
            ..Default::default()
        })
        .unwrap();
        let listing = f.catalog.list_orders(f.customer, &filter).await.unwrap();

        let OrderListing::Orders(page) = listing else {
            panic!("customers get whole orders");
        };
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, ids[2]);
        assert_eq!(page.items[1].id, ids[1]);
    }

    #[tokio::test]
    async fn merchant_sees_only_their_items() {
        let f = fixture().await;
        f.orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        let listing = f
            .catalog
            .list_orders(f.merchant, &OrderFilter::default())
            .await
            .unwrap();

        let OrderListing::Items(page) = listing else {
            panic!("merchants get order items");
        };
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].merchant_id, f.merchant.id);
    }

    #[tokio::test]
    async fn reversed_date_range_is_invalid() {
        let params = ListingParams {
            from_date: Some("2024-05-02".to_string()),
            to_date: Some("2024-05-01".to_string()),
            ..Default::default()
        };

        let err = OrderFilter::from_params(&params).unwrap_err();
        assert!(matches!(err, ShopError::InvalidRange));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn date_window_excludes_older_orders() {
        let f = fixture().await;
        f.orders
            .create_order(f.customer, f.standard_request())
            .await
            .unwrap();

        let now = Utc::now();
        let past = OrderFilter::new(
            Some(now - Duration::days(3)),
            Some(now - Duration::days(2)),
            Pagination::default(),
        )
        .unwrap();
        let listing = f.catalog.list_orders(f.customer, &past).await.unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.total(), 0);

        let recent = OrderFilter::new(Some(now - Duration::days(1)), None, Pagination::default())
            .unwrap();
        let listing = f.catalog.list_orders(f.customer, &recent).await.unwrap();
        assert_eq!(listing.total(), 1);
    }

    #[tokio::test]
    async fn product_filters_by_name_and_price() {
        let f = fixture().await;

        let filter = ProductFilter::from_params(&ListingParams {
            category: Some("kitchen".to_string()),
            brand: Some("FORGE".to_string()),
            price: Some("5.00".to_string()),
            ..Default::default()
        })
        .unwrap();
        let page = f.catalog.list_products(&filter, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, f.q.id);

        let unknown = ProductFilter::from_params(&ListingParams {
            category: Some("Garden".to_string()),
            ..Default::default()
        })
        .unwrap();
        let page = f.catalog.list_products(&unknown, None).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn merchant_product_listing_is_scoped() {
        let f = fixture().await;

        let page = f
            .catalog
            .list_merchant_products(f.other_merchant, &ProductFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, f.q.id);
    }

    #[tokio::test]
    async fn profile_hides_password_hash() {
        let f = fixture().await;

        let profile = f.catalog.get_profile(f.customer).await.unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["first_name"], "Carol");
        assert!(json.get("password_hash").is_none());
    }
}
