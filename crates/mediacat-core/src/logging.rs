//! Structured logging schema and field name constants for mediacat.
//!
//! Every crate logs with these field names so log queries work the same
//! across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, slow query |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-row iteration |
//!
//! Bound parameter values are never logged, only their count.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of the HTTP request that triggered the operation.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "movie_search", "metadata_types", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "fuzzy_search", "fetch_all", "create"
pub const OPERATION: &str = "op";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of positional parameters bound to a statement.
pub const PARAM_COUNT: &str = "param_count";

// ─── Search-specific fields ────────────────────────────────────────────────

/// Number of free-text words used for ranking.
pub const INCLUDE_WORDS: &str = "include_words";

/// Number of excluded titles.
pub const EXCLUDED_TITLES: &str = "excluded_titles";

/// Number of metadata keys constrained.
pub const METADATA_KEYS: &str = "metadata_keys";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique_snake_case() {
        let fields = [
            REQUEST_ID,
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            DURATION_MS,
            RESULT_COUNT,
            PARAM_COUNT,
            INCLUDE_WORDS,
            EXCLUDED_TITLES,
            METADATA_KEYS,
            ERROR_MSG,
            SLOW,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
        for field in fields {
            assert!(field.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{}", field);
        }
    }
}
