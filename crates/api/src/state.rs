//! Shared application state.

use domain::{CatalogService, OrderService};
use store::ShopStore;

/// Services shared by every handler, all backed by one store.
pub struct AppState<S> {
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
}

impl<S: ShopStore + Clone> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store),
        }
    }
}
