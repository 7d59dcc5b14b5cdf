//! Shared pagination types for API query parameters.
//!
//! All list endpoints use offset-based pagination with `skip` and `limit`
//! parameters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 100;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 1000;

/// Standard pagination parameters for list endpoints.
///
/// The `limit` is clamped to ensure it's always between 1 and [`MAX_LIMIT`],
/// preventing both zero-result queries and excessive data fetching.
///
/// The string-ish deserialization is deliberate: these fields are flattened
/// into query structs, and query-string values arrive as strings.
#[serde_as]
#[derive(Debug, Default, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 100, max: 1000)
    #[param(default = 100, minimum = 1, maximum = 1000)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let p = Pagination::default();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_limit_clamping() {
        // Zero is clamped to 1
        let p = Pagination {
            skip: None,
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);

        // Over max is clamped to MAX_LIMIT
        let p = Pagination {
            skip: None,
            limit: Some(10_000),
        };
        assert_eq!(p.limit(), MAX_LIMIT);

        // Valid value passes through
        let p = Pagination {
            skip: None,
            limit: Some(50),
        };
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_skip_clamping() {
        // Negative is clamped to 0
        let p = Pagination {
            skip: Some(-10),
            limit: None,
        };
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_flattened_query_string_deserialization() {
        // Flattened into a query struct, values arrive as strings
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(flatten)]
            pagination: Pagination,
        }

        let parsed: Wrapper = serde_urlencoded_roundtrip("skip=20&limit=50");
        assert_eq!(parsed.pagination.skip(), 20);
        assert_eq!(parsed.pagination.limit(), 50);

        let empty: Wrapper = serde_urlencoded_roundtrip("");
        assert_eq!(empty.pagination.skip(), 0);
        assert_eq!(empty.pagination.limit(), DEFAULT_LIMIT);
    }

    fn serde_urlencoded_roundtrip<T: serde::de::DeserializeOwned>(query: &str) -> T {
        serde_json::from_value(
            serde_json::to_value(
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect::<std::collections::HashMap<String, String>>(),
            )
            .unwrap(),
        )
        .unwrap()
    }
}
