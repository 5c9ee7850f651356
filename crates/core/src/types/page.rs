//! Offset pagination envelope.
//!
//! Listing endpoints answer with
//! `{"data": [...], "links": {...}, "meta": {...}}`, where `links` holds
//! absolute URLs for the first, last, previous and next pages.

use serde::{Deserialize, Serialize};

/// A validated page request (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Items per page on every listing endpoint.
    pub const DEFAULT_PER_PAGE: u32 = 10;

    /// Create a page request. Zero values are raised to 1.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Build a request from a raw `?page=` value.
    ///
    /// Missing, non-numeric and non-positive values select the first page.
    #[must_use]
    pub fn from_query(raw: Option<&str>, per_page: u32) -> Self {
        let page = raw
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    /// The requested page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Counters describing a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    /// 1-based position of the first item, `None` for an empty page.
    pub from: Option<u64>,
    pub last_page: u32,
    pub path: String,
    pub per_page: u32,
    /// 1-based position of the last item, `None` for an empty page.
    pub to: Option<u64>,
    pub total: u64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Assemble a page.
    ///
    /// `path` is the absolute URL of the listing without a query string;
    /// links are rendered as `{path}?page={n}`.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64, path: &str) -> Self {
        let per_page = u64::from(request.per_page());
        let last_page = u32::try_from(total.div_ceil(per_page))
            .unwrap_or(u32::MAX)
            .max(1);
        let current = request.page();

        let offset = u64::from(current - 1) * per_page;
        let count = u64::try_from(data.len()).unwrap_or(u64::MAX);
        let (from, to) = if count == 0 {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + count))
        };

        let url = |page: u32| format!("{path}?page={page}");
        let links = PageLinks {
            first: url(1),
            last: url(last_page),
            prev: (current > 1).then(|| url(current - 1)),
            next: (current < last_page).then(|| url(current + 1)),
        };

        Self {
            data,
            links,
            meta: PageMeta {
                current_page: current,
                from,
                last_page,
                path: path.to_owned(),
                per_page: request.per_page(),
                to,
                total,
            },
        }
    }

    /// Convert every item, keeping links and counters.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            links: self.links,
            meta: self.meta,
        }
    }
}
