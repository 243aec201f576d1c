//! Typed listing filters built from loosely typed request parameters.

use chrono::{DateTime, NaiveDate, Utc};
use common::{Money, UserId};
use serde::{Deserialize, Serialize};
use store::{DEFAULT_LIMIT, OrderQuery, ProductQuery};

use crate::error::{Result, ShopError};

/// Raw listing parameters as they arrive from a query string.
///
/// Empty strings count as absent. `offset` carries the 1-based page
/// number, not a row offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Resolves a page size and 1-based page number into a row window.
    ///
    /// Missing values default to page 1 of 10 rows. The page size and the
    /// resulting row offset must fit in a signed 64-bit integer.
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Result<Self> {
        let limit = match limit.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => parse_positive("limit", raw)?,
            None => DEFAULT_LIMIT,
        };
        let page = match page.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => parse_positive("offset", raw)?,
            None => 1,
        };

        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| ShopError::InvalidRequest("page is out of range".to_string()))?;

        Ok(Self { limit, offset })
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 && i64::try_from(value).is_ok() => Ok(value),
        _ => Err(ShopError::InvalidRequest(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}

/// Which numeric product filter is active.
///
/// A price ceiling wins over a rating floor when both were supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericFilter {
    MaxPrice(Money),
    MinRating(f32),
}

/// Criteria for a product listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_name: Option<String>,
    pub brand_name: Option<String>,
    pub numeric: Option<NumericFilter>,
    pub pagination: Pagination,
}

impl ProductFilter {
    /// Interprets raw parameters.
    ///
    /// When `price` is present, `rating` is neither parsed nor applied.
    pub fn from_params(params: &ListingParams) -> Result<Self> {
        let pagination = Pagination::parse(params.limit.as_deref(), params.offset.as_deref())?;

        let numeric = if let Some(raw) = present(&params.price) {
            let price = raw
                .parse::<Money>()
                .map_err(|e| ShopError::InvalidRequest(format!("price: {e}")))?;
            if price.cents() < 0 {
                return Err(ShopError::InvalidRequest(
                    "price must not be negative".to_string(),
                ));
            }
            Some(NumericFilter::MaxPrice(price))
        } else if let Some(raw) = present(&params.rating) {
            let rating = raw
                .parse::<f32>()
                .ok()
                .filter(|r: &f32| r.is_finite())
                .ok_or_else(|| {
                    ShopError::InvalidRequest(format!("rating must be a number, got {raw:?}"))
                })?;
            Some(NumericFilter::MinRating(rating))
        } else {
            None
        };

        Ok(Self {
            category_name: present(&params.category).map(str::to_string),
            brand_name: present(&params.brand).map(str::to_string),
            numeric,
            pagination,
        })
    }

    /// Builds the store query, optionally scoped to one merchant's catalog.
    pub fn to_query(&self, scope: Option<UserId>) -> ProductQuery {
        let mut query = ProductQuery::new().page(self.pagination.limit, self.pagination.offset);
        query.merchant_id = scope;
        query.category_name = self.category_name.clone();
        query.brand_name = self.brand_name.clone();
        match self.numeric {
            Some(NumericFilter::MaxPrice(price)) => query.max_price = Some(price),
            Some(NumericFilter::MinRating(rating)) => query.min_rating = Some(rating),
            None => {}
        }
        query
    }
}

/// Criteria for an order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub pagination: Pagination,
}

impl OrderFilter {
    /// Interprets raw parameters.
    ///
    /// Dates are RFC 3339 timestamps or `YYYY-MM-DD`. A bare `to_date`
    /// covers its whole day. A range whose start is after its end is
    /// rejected.
    pub fn from_params(params: &ListingParams) -> Result<Self> {
        let pagination = Pagination::parse(params.limit.as_deref(), params.offset.as_deref())?;

        let from = present(&params.from_date)
            .map(|raw| parse_date("from_date", raw, DayBound::Start))
            .transpose()?;
        let to = present(&params.to_date)
            .map(|raw| parse_date("to_date", raw, DayBound::End))
            .transpose()?;

        Self::new(from, to, pagination)
    }

    /// Builds a filter from already typed bounds.
    pub fn new(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(ShopError::InvalidRange);
        }

        Ok(Self {
            from,
            to,
            pagination,
        })
    }

    pub fn to_query(&self) -> OrderQuery {
        OrderQuery {
            from: self.from,
            to: self.to,
            limit: self.pagination.limit,
            offset: self.pagination.offset,
        }
    }
}

#[derive(Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn parse_date(name: &str, raw: &str, bound: DayBound) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let invalid = || {
        ShopError::InvalidRequest(format!(
            "{name} must be RFC 3339 or YYYY-MM-DD, got {raw:?}"
        ))
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let datetime = match bound {
        DayBound::Start => date.and_hms_opt(0, 0, 0),
        DayBound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    datetime.map(|dt| dt.and_utc()).ok_or_else(invalid)
}
