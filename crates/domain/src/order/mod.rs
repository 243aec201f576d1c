//! Order creation and the manual status transitions.

mod service;

use common::{AddressId, ProductId};
use serde::{Deserialize, Serialize};

pub use service::OrderService;

/// One `{product_id, quantity}` line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A validated request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub address_id: AddressId,
    pub items: Vec<LineRequest>,
}

impl OrderRequest {
    pub fn new(address_id: AddressId) -> Self {
        Self {
            address_id,
            items: Vec::new(),
        }
    }

    /// Adds a line to the request.
    pub fn line(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.items.push(LineRequest::new(product_id, quantity));
        self
    }
}
