//! HTTP handlers, grouped by audience.

pub mod customer;
pub mod health;
pub mod merchant;
pub mod metrics;
pub mod public;

use domain::ShopError;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of a status change request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Response to an accepted status change.
///
/// `previous_status` equals `status` when the change was already applied.
#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub id: String,
    pub status: String,
    pub previous_status: String,
}

/// Parses a path identifier, reporting failures as invalid requests.
pub(crate) fn parse_id<T>(
    raw: &str,
    parse: fn(&str) -> Result<T, uuid::Error>,
) -> Result<T, ApiError> {
    parse(raw).map_err(|e| ShopError::InvalidRequest(format!("invalid id {raw:?}: {e}")).into())
}
