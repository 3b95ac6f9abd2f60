use axum::{http::StatusCode, Json};
use serde_json::json;
use validator::ValidationErrors;

pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
}

/// Compares a stored natural key (user name, order code, restaurant name)
/// against a candidate from a create request. Stored values are trimmed on
/// both sides, candidates only at the end, and the match is case-insensitive.
pub fn natural_key_matches(existing: &str, candidate: &str) -> bool {
    existing.trim().to_uppercase() == candidate.trim_end().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::natural_key_matches;

    #[test]
    fn matches_ignoring_case() {
        assert!(natural_key_matches("alice", "ALICE"));
        assert!(natural_key_matches("Pasta Palace", "pasta palace"));
    }

    #[test]
    fn matches_ignoring_surrounding_whitespace() {
        assert!(natural_key_matches("alice", "ALICE "));
        assert!(natural_key_matches("  alice  ", "alice"));
    }

    #[test]
    fn rejects_different_keys() {
        assert!(!natural_key_matches("alice", "alicia"));
        assert!(!natural_key_matches("ORD-1", "ORD-2"));
    }
}
