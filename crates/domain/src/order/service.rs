//! The order engine: creation, cancellation and merchant shipping.

use std::collections::HashMap;

use chrono::{SubsecRound, Utc};
use common::{
    ItemStatus, Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, Role,
};
use store::ShopStore;

use crate::actor::Actor;
use crate::authorization::{RequestedTransition, authorize, require_role};
use crate::error::{Result, ShopError};

use super::OrderRequest;

/// Service owning order creation and the order/item status rules.
///
/// Every lookup and validation runs before the first write, so a failed
/// call leaves no partial order behind.
#[derive(Debug, Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: ShopStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the acting customer.
    ///
    /// Validates the address binding and every product before anything is
    /// written. Item prices, names and merchants are copied from the
    /// products as they are now; later catalog changes do not affect the
    /// order.
    #[tracing::instrument(skip(self, request), fields(customer_id = %actor.id, lines = request.items.len()))]
    pub async fn create_order(&self, actor: Actor, request: OrderRequest) -> Result<Order> {
        require_role(&actor, Role::Customer, "create order")?;

        if request.items.is_empty() {
            return Err(ShopError::EmptyOrder);
        }
        if let Some(line) = request.items.iter().find(|line| line.quantity == 0) {
            return Err(ShopError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        let address = self
            .store
            .find_address(request.address_id, actor.id)
            .await?
            .ok_or(ShopError::AddressNotOwned(request.address_id))?;

        let ids: Vec<_> = request.items.iter().map(|line| line.product_id).collect();
        let products: HashMap<_, Product> = self
            .store
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let order_id = OrderId::new();
        // Microsecond precision matches what PostgreSQL keeps.
        let created_at = Utc::now().trunc_subsecs(6);

        let items = request
            .items
            .iter()
            .map(|line| -> Result<OrderItem> {
                let product = products
                    .get(&line.product_id)
                    .ok_or(ShopError::ProductNotFound(line.product_id))?;

                Ok(OrderItem {
                    id: OrderItemId::new(),
                    order_id,
                    product_id: product.id,
                    merchant_id: product.merchant_id,
                    customer_id: actor.id,
                    address_id: address.id,
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    price: product.price,
                    status: ItemStatus::Placed,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let customer = self
            .store
            .find_user(actor.id)
            .await?
            .ok_or(ShopError::CustomerNotFound(actor.id))?;

        let total_amount = items
            .iter()
            .map(OrderItem::line_total)
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line?))
            .ok_or(ShopError::TotalOutOfRange)?;

        let order = Order {
            id: order_id,
            user_id: customer.id,
            address_id: address.id,
            name: customer.full_name(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            items,
            total_amount,
            status: OrderStatus::InProgress,
            created_at,
        };

        self.store.create_order(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            total_cents = order.total_amount.cents(),
            items = order.items.len(),
            "order created"
        );

        Ok(order)
    }

    /// Applies a customer-requested status to one of their orders.
    ///
    /// Only `Cancelled` may be requested. Cancelling also forces every item
    /// of the order to `Cancelled`, whatever its current status. Returns the
    /// status the order had before the call.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.id))]
    pub async fn update_order_status(
        &self,
        actor: Actor,
        order_id: OrderId,
        requested: OrderStatus,
    ) -> Result<OrderStatus> {
        authorize(actor.role, RequestedTransition::Order(requested))?;

        let order = self
            .store
            .find_order(order_id, actor.id)
            .await?
            .ok_or(ShopError::OrderNotFound(order_id))?;

        if !order.status.can_cancel() {
            metrics::counter!("order_transitions_rejected_total", "reason" => "invalid_transition")
                .increment(1);
            return Err(ShopError::order_transition(order.status, requested));
        }

        if !self
            .store
            .update_order_status(order_id, OrderStatus::Cancelled)
            .await?
        {
            return Err(ShopError::OrderNotFound(order_id));
        }

        let cancelled_items = self
            .store
            .update_order_items_status(order_id, ItemStatus::Cancelled)
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, previous = %order.status, cancelled_items, "order cancelled");

        Ok(order.status)
    }

    /// Cancels one of the acting customer's orders.
    pub async fn cancel_order(&self, actor: Actor, order_id: OrderId) -> Result<OrderStatus> {
        self.update_order_status(actor, order_id, OrderStatus::Cancelled)
            .await
    }

    /// Applies a merchant-requested status to one of their order items.
    ///
    /// Only `Shipped` may be requested. The parent order is left untouched.
    /// Returns the status the item had before the call.
    #[tracing::instrument(skip(self), fields(merchant_id = %actor.id))]
    pub async fn update_order_item_status(
        &self,
        actor: Actor,
        item_id: OrderItemId,
        requested: ItemStatus,
    ) -> Result<ItemStatus> {
        authorize(actor.role, RequestedTransition::Item(requested))?;

        let item = self
            .store
            .find_order_item(item_id, actor.id)
            .await?
            .ok_or(ShopError::OrderItemNotFound(item_id))?;

        if !item.status.can_ship() {
            metrics::counter!("order_transitions_rejected_total", "reason" => "invalid_transition")
                .increment(1);
            return Err(ShopError::item_transition(item.status, requested));
        }

        if !self
            .store
            .update_order_item_status(item_id, ItemStatus::Shipped)
            .await?
        {
            return Err(ShopError::OrderItemNotFound(item_id));
        }

        metrics::counter!("order_items_shipped_total").increment(1);
        tracing::info!(
            %item_id,
            order_id = %item.order_id,
            previous = %item.status,
            "order item shipped"
        );

        Ok(item.status)
    }

    /// Loads one of the acting customer's orders with its items.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.id))]
    pub async fn get_order(&self, actor: Actor, order_id: OrderId) -> Result<Order> {
        require_role(&actor, Role::Customer, "view order")?;

        self.store
            .find_order(order_id, actor.id)
            .await?
            .ok_or(ShopError::OrderNotFound(order_id))
    }

    /// Loads the acting merchant's items of one order.
    ///
    /// An order with none of the merchant's items is reported as not found.
    #[tracing::instrument(skip(self), fields(merchant_id = %actor.id))]
    pub async fn get_merchant_order(
        &self,
        actor: Actor,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>> {
        require_role(&actor, Role::Merchant, "view merchant order")?;

        let items = self.store.find_order_items(order_id, actor.id).await?;
        if items.is_empty() {
            return Err(ShopError::OrderNotFound(order_id));
        }
        Ok(items)
    }
}
