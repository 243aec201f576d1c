use chrono::{DateTime, Utc};
use common::{Money, UserId};
use serde::Serialize;

/// Default page size used when a listing does not specify one.
pub const DEFAULT_LIMIT: usize = 10;

/// Criteria for a product listing.
///
/// All filters are conjunctive. Name filters match case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Restrict to one merchant's catalog.
    pub merchant_id: Option<UserId>,

    /// Filter by category name.
    pub category_name: Option<String>,

    /// Filter by brand name.
    pub brand_name: Option<String>,

    /// Only products priced at or below this amount.
    pub max_price: Option<Money>,

    /// Only products rated at or above this value.
    pub min_rating: Option<f32>,

    /// Maximum number of products to return.
    pub limit: usize,

    /// Number of products to skip.
    pub offset: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            merchant_id: None,
            category_name: None,
            brand_name: None,
            max_price: None,
            min_rating: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ProductQuery {
    /// Creates a query matching every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to products owned by a merchant.
    pub fn merchant(mut self, merchant_id: UserId) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    /// Filters by category name.
    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    /// Filters by brand name.
    pub fn brand(mut self, name: impl Into<String>) -> Self {
        self.brand_name = Some(name.into());
        self
    }

    /// Filters to products at or below a price.
    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Filters to products at or above a rating.
    pub fn min_rating(mut self, rating: f32) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Sets the page window.
    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// One window of a listing plus the number of rows matching overall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows before `limit`/`offset` were applied.
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Applies `limit`/`offset` to an already filtered and sorted list.
    pub fn slice(all: Vec<T>, limit: usize, offset: usize) -> Self {
        let total = all.len() as u64;
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// Maps every item, keeping the window.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Criteria for an order (or order item) listing.
///
/// Both bounds are inclusive and apply to `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters to orders created at or after this timestamp.
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Filters to orders created at or before this timestamp.
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the page window.
    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Returns true if `created_at` falls inside the date window.
    pub fn matches(&self, created_at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| created_at >= from) && self.to.is_none_or(|to| created_at <= to)
    }
}
