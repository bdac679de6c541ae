//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

/// Maximum length of a search query.
pub const MAX_SEARCH_QUERY_LENGTH: u64 = 200;

/// Search query parameters.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search text; matched case-insensitively against body and sender.
    #[serde(default)]
    #[validate(length(max = 200, message = "Search query must be at most 200 characters"))]
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_length() {
        let query = SearchQuery {
            q: Some("hello".to_string()),
        };
        assert!(query.validate().is_ok());

        let query = SearchQuery {
            q: Some("x".repeat(MAX_SEARCH_QUERY_LENGTH as usize + 1)),
        };
        assert!(query.validate().is_err());

        assert!(SearchQuery::default().validate().is_ok());
    }
}
