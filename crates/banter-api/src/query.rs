//! Read-query shaping: pagination bounds and the search minimum, defined
//! once for every call site.

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 200;
pub const MAX_SEARCH_RESULTS: u32 = 100;
pub const MIN_SEARCH_CHARS: usize = 2;

/// Offset/limit pagination. Deserializing as unsigned integers makes the
/// extractor reject negative or non-numeric input before a handler runs.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl FeedQuery {
    /// Resolved (offset, limit): zero means default, oversized limits
    /// are clamped rather than rejected.
    pub fn clamped(&self) -> (u32, u32) {
        let limit = if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit.min(MAX_PAGE_LIMIT)
        };
        (self.offset, limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub channel: Option<String>,
}

pub fn validate_search_query(q: &str) -> Result<(), ApiError> {
    if q.chars().count() < MIN_SEARCH_CHARS {
        return Err(ApiError::Validation(format!(
            "search query must be at least {} characters",
            MIN_SEARCH_CHARS
        )));
    }
    Ok(())
}
