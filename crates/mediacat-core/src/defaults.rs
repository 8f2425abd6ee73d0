//! Centralized default constants for mediacat.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// SEARCH
// =============================================================================

/// Default number of movies returned by a fuzzy search.
pub const SEARCH_LIMIT: i64 = 10;

/// Largest `limit` a single search request may ask for.
pub const SEARCH_MAX_LIMIT: i64 = 500;

/// Number of movies returned by the type-ahead hint endpoint.
pub const HINT_LIMIT: i64 = 10;

/// Minimum character length of a free-text search term once its `+`/`-`
/// prefix is removed. Shorter terms are ignored.
pub const MIN_TERM_LEN: usize = 2;

/// Maximum number of metadata values across all keys in one request.
pub const MAX_METADATA_VALUES: usize = 1000;

/// Searches slower than this are logged at WARN.
pub const SLOW_SEARCH_MS: u64 = 500;

// =============================================================================
// DATABASE
// =============================================================================

/// Default database URL when `DATABASE_URL` is not set.
pub const DATABASE_URL: &str = "postgres://localhost/mediaserver";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default pool acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default number of connections kept open when idle.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Default idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default maximum connection age in seconds (0 in config disables recycling).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 5000;
