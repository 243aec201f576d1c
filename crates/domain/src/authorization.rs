//! Which manual status transitions each role may request.
//!
//! A closed table with no I/O. Ownership of the target record is checked
//! separately by the order engine, through owner-scoped lookups.

use common::{ItemStatus, OrderStatus, Role};

use crate::actor::Actor;
use crate::error::ShopError;

/// A status change an actor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedTransition {
    /// A new status for a whole order.
    Order(OrderStatus),
    /// A new status for a single order item.
    Item(ItemStatus),
}

impl RequestedTransition {
    /// Short label used in logs and the rejection metric.
    pub fn label(&self) -> &'static str {
        match self {
            RequestedTransition::Order(status) => status.as_str(),
            RequestedTransition::Item(status) => status.as_str(),
        }
    }

    /// Reads a wire status sent to an order endpoint.
    ///
    /// Order statuses win where the two vocabularies overlap. Item-only
    /// statuses are still recognised so that they are rejected as
    /// forbidden rather than as unknown.
    pub fn parse_for_order(raw: &str) -> Result<Self, ShopError> {
        raw.parse()
            .map(RequestedTransition::Order)
            .or_else(|_| raw.parse().map(RequestedTransition::Item))
            .map_err(|_| unknown_status(raw))
    }

    /// Reads a wire status sent to an order item endpoint, preferring item
    /// statuses.
    pub fn parse_for_item(raw: &str) -> Result<Self, ShopError> {
        raw.parse()
            .map(RequestedTransition::Item)
            .or_else(|_| raw.parse().map(RequestedTransition::Order))
            .map_err(|_| unknown_status(raw))
    }
}

fn unknown_status(raw: &str) -> ShopError {
    ShopError::InvalidRequest(format!("unknown status {:?}", raw.trim()))
}

/// Returns true if `role` may request `transition`.
pub fn is_allowed(role: Role, transition: RequestedTransition) -> bool {
    matches!(
        (role, transition),
        (Role::Customer, RequestedTransition::Order(OrderStatus::Cancelled))
            | (Role::Merchant, RequestedTransition::Item(ItemStatus::Shipped))
    )
}

/// Like [`is_allowed`], but yields `Forbidden` on rejection.
pub fn authorize(role: Role, transition: RequestedTransition) -> Result<(), ShopError> {
    if is_allowed(role, transition) {
        return Ok(());
    }

    Err(rejected(role, transition))
}

/// Authorizes a status requested for a whole order and returns it.
pub fn authorize_order(
    role: Role,
    transition: RequestedTransition,
) -> Result<OrderStatus, ShopError> {
    match transition {
        RequestedTransition::Order(status) if is_allowed(role, transition) => Ok(status),
        _ => Err(rejected(role, transition)),
    }
}

/// Authorizes a status requested for one order item and returns it.
pub fn authorize_item(
    role: Role,
    transition: RequestedTransition,
) -> Result<ItemStatus, ShopError> {
    match transition {
        RequestedTransition::Item(status) if is_allowed(role, transition) => Ok(status),
        _ => Err(rejected(role, transition)),
    }
}

fn rejected(role: Role, transition: RequestedTransition) -> ShopError {
    tracing::warn!(%role, requested = transition.label(), "status transition rejected");
    metrics::counter!("order_transitions_rejected_total", "reason" => "forbidden").increment(1);

    let target = match transition {
        RequestedTransition::Order(_) => "order",
        RequestedTransition::Item(_) => "order item",
    };
    ShopError::Forbidden(format!(
        "role {role} may not set {target} status to {}",
        transition.label()
    ))
}

/// Rejects actors whose role is not `expected` for a role-bound operation.
pub fn require_role(actor: &Actor, expected: Role, operation: &str) -> Result<(), ShopError> {
    if actor.role == expected {
        return Ok(());
    }

    tracing::warn!(actor_id = %actor.id, role = %actor.role, operation, "role rejected");
    Err(ShopError::Forbidden(format!(
        "{operation} requires role {expected}, not {}",
        actor.role
    )))
}
