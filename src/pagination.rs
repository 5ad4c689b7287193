//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The page number, starting at 1.
    pub page: u64,
    /// The maximum number of items on a page.
    pub per_page: u64,
}

impl Pagination {
    /// Build a page from raw query parameters.
    ///
    /// Missing, unparsable or zero values fall back to the defaults in
    /// `config`. There is no upper bound on `per_page`.
    pub fn from_query(
        page: Option<&str>,
        per_page: Option<&str>,
        config: &PaginationConfig,
    ) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(config.default_page),
            per_page: parse_positive(per_page).unwrap_or(config.default_page_size),
        }
    }

    /// The number of items to skip before the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let raw = raw?;

    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!("Ignoring invalid pagination value {raw:?}");
            None
        }
    }
}
