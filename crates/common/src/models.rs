//! Persistent records shared by the store and the domain layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AddressId, BrandId, CategoryId, ItemStatus, Money, OrderId, OrderItemId, OrderStatus,
    ProductId, Role, UserId,
};

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Never leaves the process in a response body.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns `"first last"`, the form snapshotted onto orders.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A shipping address owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub door_no: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// A catalog product listed by a merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub brand_id: BrandId,
    /// The merchant that owns the listing.
    pub merchant_id: UserId,
    #[serde(rename = "price_cents")]
    pub price: Money,
    pub rating: f32,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A placed order.
///
/// `name`, `email`, `phone` and `total_amount` are snapshots taken when the
/// order was created and are never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sums `price * quantity` over the items, or `None` on overflow.
    pub fn items_total(&self) -> Option<Money> {
        self.items
            .iter()
            .map(OrderItem::line_total)
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line?))
    }
}

/// One line of an order, fulfilled independently by the owning merchant.
///
/// `merchant_id`, `product_name` and `price` are copied from the product
/// when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub merchant_id: UserId,
    pub customer_id: UserId,
    pub address_id: AddressId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(rename = "price_cents")]
    pub price: Money,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns `price * quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_cents: i64, quantity: u32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            merchant_id: UserId::new(),
            customer_id: UserId::new(),
            address_id: AddressId::new(),
            product_name: "Widget".to_string(),
            quantity,
            price: Money::from_cents(price_cents),
            status: ItemStatus::Placed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(item(1000, 3).line_total(), Some(Money::from_cents(3000)));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: UserId::new(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "5550100100".to_string(),
            password_hash: "$2b$08$secret".to_string(),
            role: Role::Customer,
            is_verified: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "customer");
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
