//! Listing query parameters.

use axum_helpers::FieldErrors;
use serde::{Deserialize, Deserializer, de::Error as _};
use std::{fmt::Display, str::FromStr};
use utoipa::IntoParams;

use crate::models::{SortField, SortOrder};

pub const DEFAULT_PER_PAGE: u64 = 15;

/// Upper bound for `page` and `per_page`; offsets and limits are bound as
/// signed 64-bit integers.
pub const MAX_PAGE_VALUE: u64 = i64::MAX as u64;

/// Query string of `GET /products`, as sent. Empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring of the name
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    /// Exact category
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<String>,
    /// Inclusive lower price bound
    #[serde(default, deserialize_with = "parsed")]
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    #[serde(default, deserialize_with = "parsed")]
    pub max_price: Option<f64>,
    /// `price`, `rating`, `created_at` (default) or `name`. Any other value applies no ordering.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort_order: Option<String>,
    /// Page size, default 15
    #[serde(default, deserialize_with = "parsed")]
    pub per_page: Option<u64>,
    /// 1-based page number
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<u64>)]
    pub page: Option<String>,
}

/// Parsed listing query handed to the repository
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `None` means rows come back in storage order. Newest first unless
    /// the caller names a column.
    pub sort: Option<(SortField, SortOrder)>,
    pub page: u64,
    pub per_page: u64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            min_price: None,
            max_price: None,
            sort: Some((SortField::CreatedAt, SortOrder::Desc)),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ProductQuery {
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .min(MAX_PAGE_VALUE)
    }
}

impl TryFrom<ListQuery> for ProductQuery {
    type Error = FieldErrors;

    fn try_from(query: ListQuery) -> Result<Self, Self::Error> {
        // An unrecognised column skips ordering, direction included
        let sort = match query.sort_by.as_deref() {
            None => Some(SortField::CreatedAt),
            Some(raw) => raw.parse::<SortField>().ok(),
        }
        .map(|field| parse_order(query.sort_order.as_deref()).map(|order| (field, order)))
        .transpose()?;

        let page = query
            .page
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
            .min(MAX_PAGE_VALUE);

        Ok(Self {
            search: query.search,
            category: query.category,
            min_price: query.min_price,
            max_price: query.max_price,
            sort,
            page,
            per_page: query
                .per_page
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PAGE_VALUE),
        })
    }
}

fn parse_order(raw: Option<&str>) -> Result<SortOrder, FieldErrors> {
    match raw {
        None => Ok(SortOrder::default()),
        Some(raw) => raw
            .parse::<SortOrder>()
            .map_err(|_| FieldErrors::single("sort_order", "The selected sort order is invalid.")),
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    blank_as_none(deserializer)?
        .map(|raw| raw.parse::<T>().map_err(D::Error::custom))
        .transpose()
}
