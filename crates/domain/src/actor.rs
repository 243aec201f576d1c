//! The authenticated party behind a request.

use common::{Role, UserId};
use serde::{Deserialize, Serialize};

/// An authenticated actor: who is calling, and in which role.
///
/// Resolved by the transport layer and passed by value into every core
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn customer(id: UserId) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn merchant(id: UserId) -> Self {
        Self::new(id, Role::Merchant)
    }

    pub fn admin(id: UserId) -> Self {
        Self::new(id, Role::Admin)
    }
}
