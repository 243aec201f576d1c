//! Domain error types.

use std::fmt;

use common::{
    AddressId, BrandId, CategoryId, ItemStatus, OrderId, OrderItemId, OrderStatus, ProductId,
    UserId,
};
use serde::Serialize;
use store::StoreError;
use thiserror::Error;

/// Abstract failure categories exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidRequest,
    Conflict,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The address does not exist or belongs to another user.
    #[error("Address not found: {0}")]
    AddressNotOwned(AddressId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The acting customer has no user record.
    #[error("Customer not found: {0}")]
    CustomerNotFound(UserId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Brand not found: {0}")]
    BrandNotFound(BrandId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order item not found: {0}")]
    OrderItemNotFound(OrderItemId),

    /// The actor's role may not perform the requested operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The record's current status does not admit the requested one.
    #[error("Invalid state transition: cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// The order total does not fit in the money range.
    #[error("Order total is out of range")]
    TotalOutOfRange,

    /// A filter, identifier or payload value could not be interpreted.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid date range: from_date is after to_date")]
    InvalidRange,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl ShopError {
    /// Maps this error onto its abstract kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShopError::AddressNotOwned(_)
            | ShopError::ProductNotFound(_)
            | ShopError::CustomerNotFound(_)
            | ShopError::UserNotFound(_)
            | ShopError::CategoryNotFound(_)
            | ShopError::BrandNotFound(_)
            | ShopError::OrderNotFound(_)
            | ShopError::OrderItemNotFound(_) => ErrorKind::NotFound,
            ShopError::Forbidden(_) => ErrorKind::Forbidden,
            ShopError::EmptyOrder
            | ShopError::InvalidQuantity { .. }
            | ShopError::TotalOutOfRange
            | ShopError::InvalidRequest(_)
            | ShopError::InvalidRange => ErrorKind::InvalidRequest,
            ShopError::InvalidTransition { .. } | ShopError::Conflict(_) => ErrorKind::Conflict,
            ShopError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn order_transition(from: OrderStatus, to: OrderStatus) -> Self {
        ShopError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn item_transition(from: ItemStatus, to: ItemStatus) -> Self {
        ShopError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<StoreError> for ShopError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { entity, detail } => {
                ShopError::Conflict(format!("{entity} already exists ({detail})"))
            }
            other => ShopError::Storage(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, ShopError>;
