use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::status::UnknownVariant;

/// Role of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Places and cancels orders. Older clients send `"user"`.
    #[serde(alias = "user")]
    Customer,
    /// Owns products and ships the order items for them.
    Merchant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Merchant => "merchant",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "merchant" => Ok(Role::Merchant),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_user_alias() {
        assert_eq!("user".parse::<Role>(), Ok(Role::Customer));
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn unknown_role() {
        assert!("superuser".parse::<Role>().is_err());
    }
}
