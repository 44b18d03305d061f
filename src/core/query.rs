//! List page parameters carried in the URL query string
//!
//! A list view is fully described by its URL:
//!
//! ```text
//! /crud/Hero                          offset 0, default page size, no filter
//! /crud/Hero?offset=20&page-size=5
//! /crud/Hero?filter=spider
//! ```
//!
//! Values equal to their defaults are left out when a URL is formatted, and
//! unknown parameters survive the round trip.

use std::collections::BTreeMap;

/// Default number of rows on a list page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pagination and filter state of one list view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Number of matching rows skipped
    pub offset: usize,

    /// Maximum rows per page, never zero
    pub page_size: usize,

    /// Filter text; empty means no filtering
    pub filter: String,

    /// Unrecognised query parameters, kept for redirects
    pub extra: BTreeMap<String, String>,

    default_page_size: usize,
}

impl ListParams {
    /// Parameters of an unfiltered first page
    pub fn new(default_page_size: usize) -> Self {
        let default_page_size = default_page_size.max(1);
        Self {
            offset: 0,
            page_size: default_page_size,
            filter: String::new(),
            extra: BTreeMap::new(),
            default_page_size,
        }
    }

    /// Parse a raw query string (without the leading `?`)
    ///
    /// Keys are normalised so that `page_size` and `page-size` are the same
    /// parameter. Unparseable numbers fall back to their defaults.
    pub fn from_query(query: Option<&str>, default_page_size: usize) -> Self {
        let mut params = Self::new(default_page_size);
        let pairs: Vec<(String, String)> = query
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();

        for (key, value) in pairs {
            match key.replace('_', "-").as_str() {
                "offset" => params.offset = value.trim().parse().unwrap_or(0),
                "page-size" => {
                    params.page_size = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|size: &usize| *size > 0)
                        .unwrap_or(params.default_page_size)
                }
                "filter" => params.filter = value,
                _ => {
                    params.extra.insert(key, value);
                }
            }
        }

        params
    }

    /// Query string without defaults, or an empty string
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if self.offset != 0 {
            pairs.push(("offset".to_string(), self.offset.to_string()));
        }
        if self.page_size != self.default_page_size {
            pairs.push(("page-size".to_string(), self.page_size.to_string()));
        }
        if !self.filter.is_empty() {
            pairs.push(("filter".to_string(), self.filter.clone()));
        }
        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }

    /// `base` with this view's query string appended
    pub fn href(&self, base: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, query)
        }
    }

    /// Previous page, clamped at offset 0
    pub fn prev_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(self.page_size),
            ..self.clone()
        }
    }

    /// Next page, saturating at `usize::MAX`
    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.page_size),
            ..self.clone()
        }
    }

    /// Change the page size; non-numeric or zero input yields `None`
    pub fn with_page_size(&self, raw: &str) -> Option<Self> {
        let page_size = raw.trim().parse::<usize>().ok().filter(|s| *s > 0)?;
        Some(Self {
            page_size,
            ..self.clone()
        })
    }

    /// Change the filter and return to the first page
    pub fn with_filter(&self, filter: &str) -> Self {
        Self {
            offset: 0,
            filter: filter.to_string(),
            ..self.clone()
        }
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Whether another page may follow a page of `page_len` rows
    ///
    /// True iff the page is exactly full, so a table whose size is a multiple
    /// of the page size reports one empty page too many.
    pub fn has_next(&self, page_len: usize) -> bool {
        page_len == self.page_size
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
