//! Length-aware page object with navigation links.

use axum::http::{HeaderMap, Uri, header};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Base URL of the current listing plus the query pairs to carry over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    path: String,
    query: Vec<String>,
}

impl PageUrl {
    pub fn new(path: impl Into<String>, raw_query: Option<&str>) -> Self {
        let query = raw_query
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| pair.split('=').next() != Some("page"))
            .map(str::to_string)
            .collect();

        Self {
            path: path.into(),
            query,
        }
    }

    /// Absolute when the request carried a `Host` header.
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()));

        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");

        let path = match host {
            Some(host) => format!("{}://{}{}", scheme, host, uri.path()),
            None => uri.path().to_string(),
        };

        Self::new(path, uri.query())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page(&self, page: u64) -> String {
        let mut pairs = self.query.clone();
        pairs.push(format!("page={}", page));
        format!("{}?{}", self.path, pairs.join("&"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub current_page: u64,
    /// 1-based position of the first item, null on an empty page
    pub from: Option<u64>,
    pub last_page: u64,
    pub path: String,
    pub per_page: u64,
    pub to: Option<u64>,
    pub total: u64,
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, per_page: u64, url: &PageUrl) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let last_page = total.div_ceil(per_page).max(1);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = (page - 1).saturating_mul(per_page).saturating_add(1);
            (Some(from), Some(from.saturating_add(data.len() as u64 - 1)))
        };

        let links = PageLinks {
            first: url.page(1),
            last: url.page(last_page),
            prev: (page > 1).then(|| url.page(page - 1)),
            next: (page < last_page).then(|| url.page(page + 1)),
        };

        Self {
            data,
            links,
            meta: PageMeta {
                current_page: page,
                from,
                last_page,
                path: url.path().to_string(),
                per_page,
                to,
                total,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            links: self.links,
            meta: self.meta,
        }
    }
}
