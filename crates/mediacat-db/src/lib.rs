//! # mediacat-db
//!
//! PostgreSQL layer for the mediacat media-library catalog.
//!
//! This crate provides:
//! - Connection pool management
//! - The metadata type catalog lookup
//! - A parameterised SQL fragment builder
//! - Fuzzy, multi-criteria movie search
//!
//! ## Example
//!
//! ```rust,ignore
//! use mediacat_db::{Database, MovieSearchRepository, RequestContext, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/mediaserver").await?;
//!
//!     let query = SearchQuery::new()
//!         .with_terms(["batman", "-robin"])
//!         .with_metadata("genre", ["action", "-horror"]);
//!     for movie in db.movies.fuzzy_search(&RequestContext::new(), &query).await? {
//!         println!("{} ({:.2})", movie.movie_title, movie.similarity);
//!     }
//!     Ok(())
//! }
//! ```
pub mod clause;
pub mod metadata_filter;
pub mod metadata_types;
pub mod movie_search;
pub mod pool;
pub mod sql_expr;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use mediacat_core::*;

pub use clause::{assemble_clauses, SearchClauses};
pub use metadata_filter::{compile_metadata_constraint, MetadataConstraintBuilder};
pub use metadata_types::{fetch_metadata_types, PgMetadataTypeRepository};
pub use movie_search::{
    build_movie_search, movie_fuzzy_search, MovieSearchPlan, PgMovieSearch, PgSearchSession,
    SearchSession,
};
pub use pool::{create_pool, create_pool_with_config, log_pool_pressure, PoolConfig, PoolPressure};
pub use sql_expr::{CompareOp, QueryParam, RenderedSql, SqlExpr, SqlWriter};

/// Database handle with every repository.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Fuzzy movie search.
    pub movies: PgMovieSearch,
    /// Metadata type catalog.
    pub metadata_types: PgMetadataTypeRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            movies: PgMovieSearch::new(pool.clone()),
            metadata_types: PgMetadataTypeRepository::new(pool.clone()),
            pool,
        }
    }

    /// Replace the search configuration used by `movies`.
    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.movies = self.movies.with_config(config);
        self
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
