//! Fuzzy, multi-criteria movie search.
//!
//! A search is one two-tier statement:
//!
//! 1. the inner query scores every movie not excluded by title, orders by
//!    score and keeps the top `limit` rows (`q1`);
//! 2. the outer query keeps the `q1` rows that pass the metadata constraints.
//!
//! Metadata filtering runs after the limit, so fewer than `limit` rows can
//! come back even when more matching movies exist below the rank cutoff.
//!
//! Positional parameters bind in statement order: the ranking word array (if
//! any words), excluded titles, the limit, metadata values in key order, then
//! the similarity threshold (if configured).

use std::time::Instant;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::{debug, info, warn};

use mediacat_core::defaults::SLOW_SEARCH_MS;
use mediacat_core::{
    classify_terms, parse_metadata_key, split_metadata_values, Error, MetadataTypeMap,
    MovieSearchRepository, RankedMovie, RequestContext, Result, SearchConfig, SearchQuery,
};

use crate::clause::assemble_clauses;
use crate::metadata_filter::compile_metadata_constraint;
use crate::metadata_types::fetch_metadata_types;
use crate::pool::log_pool_pressure;
use crate::sql_expr::{CompareOp, QueryParam, RenderedSql, SqlExpr, SqlWriter};

/// A rendered search statement plus the counts worth logging.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSearchPlan {
    pub statement: RenderedSql,
    pub include_words: usize,
    pub excluded_titles: usize,
    pub metadata_keys: usize,
}

/// Compose the two-tier search statement for `query`.
///
/// Every metadata key is resolved against `catalog` before anything else;
/// an unknown name fails with [`Error::InvalidMetadataType`].
pub fn build_movie_search(
    query: &SearchQuery,
    catalog: &MetadataTypeMap,
    config: &SearchConfig,
) -> Result<MovieSearchPlan> {
    let mut resolved = Vec::with_capacity(query.metadata.len());
    for (raw_key, raw_values) in &query.metadata {
        let Some(key) = parse_metadata_key(raw_key) else {
            continue;
        };
        let type_id = catalog
            .get(key.name)
            .copied()
            .ok_or_else(|| Error::InvalidMetadataType(key.name.to_string()))?;
        resolved.push((type_id, key.negated, split_metadata_values(raw_values)));
    }

    let terms = classify_terms(&query.terms);

    let fragments = resolved
        .iter()
        .map(|(type_id, negated, values)| compile_metadata_constraint(*type_id, values, *negated))
        .collect();

    let clauses = assemble_clauses(&terms.exclude_titles, fragments, config.metadata_match);

    let similarity = if terms.include_words.is_empty() {
        SqlExpr::sql("1::float8")
    } else {
        SqlExpr::seq([
            SqlExpr::sql("total_similarity(t.title_words, "),
            SqlExpr::param(QueryParam::StringArray(terms.include_words.clone())),
            SqlExpr::sql("::varchar[])::float8"),
        ])
    };

    let outer_filter = match config.min_similarity {
        Some(threshold) => SqlExpr::and([
            clauses.metadata_filter,
            SqlExpr::compare(
                SqlExpr::sql("q1.similarity"),
                CompareOp::GtEq,
                SqlExpr::param(QueryParam::Float(threshold)),
            ),
        ]),
        None => clauses.metadata_filter,
    };

    let mut writer = SqlWriter::new();
    writer.push_sql(
        "SELECT q1.movie_id, q1.movie_title, q1.release_year, q1.similarity \
         FROM (SELECT t.movie_id::int8 AS movie_id, \
         t.movie_title::text AS movie_title, \
         t.release_year::int4 AS release_year, ",
    );
    writer.push_expr(&similarity);
    writer.push_sql(" AS similarity FROM mediaserver.movie AS t WHERE ");
    writer.push_expr(&clauses.candidate_filter);
    writer.push_sql(" ORDER BY similarity DESC, t.movie_id LIMIT ");
    writer.push_param(QueryParam::BigInt(query.limit));
    writer.push_sql(") AS q1 WHERE ");
    writer.push_expr(&outer_filter);
    writer.push_sql(" ORDER BY q1.similarity DESC, q1.movie_id");

    Ok(MovieSearchPlan {
        statement: writer.finish(),
        include_words: terms.include_words.len(),
        excluded_titles: terms.exclude_titles.len(),
        metadata_keys: resolved.len(),
    })
}

fn ranked_movie_from_row(row: &PgRow) -> Result<RankedMovie> {
    Ok(RankedMovie {
        movie_id: row.try_get("movie_id")?,
        movie_title: row.try_get("movie_title")?,
        release_year: row.try_get("release_year")?,
        similarity: row.try_get("similarity")?,
    })
}

// =============================================================================
// SESSION
// =============================================================================

/// The storage round trips one search needs, on a single connection.
#[async_trait]
pub trait SearchSession: Send {
    /// Current metadata type catalog.
    async fn metadata_types(&mut self) -> Result<MetadataTypeMap>;

    /// Run a rendered search statement.
    async fn fetch_movies(&mut self, statement: &RenderedSql) -> Result<Vec<RankedMovie>>;
}

/// Search session holding at most one pooled connection.
///
/// The connection is acquired on first use and returned to the pool when the
/// session is dropped, whichever way the search ends.
pub struct PgSearchSession {
    pool: Pool<Postgres>,
    conn: Option<PoolConnection<Postgres>>,
}

impl PgSearchSession {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool, conn: None }
    }

    async fn conn(&mut self) -> Result<&mut PgConnection> {
        if self.conn.is_none() {
            let conn = self.pool.acquire().await.map_err(Error::Database)?;
            self.conn = Some(conn);
        }
        match self.conn.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(Error::Internal("search connection missing".to_string())),
        }
    }
}

#[async_trait]
impl SearchSession for PgSearchSession {
    async fn metadata_types(&mut self) -> Result<MetadataTypeMap> {
        let conn = self.conn().await?;
        fetch_metadata_types(conn).await
    }

    async fn fetch_movies(&mut self, statement: &RenderedSql) -> Result<Vec<RankedMovie>> {
        let conn = self.conn().await?;
        let rows = statement
            .query()
            .fetch_all(conn)
            .await
            .map_err(Error::Database)?;
        rows.iter().map(ranked_movie_from_row).collect()
    }
}

/// Run a fuzzy movie search on `session`.
///
/// Validates the request, re-reads the metadata catalog, composes the
/// statement and executes it. No rows are read when validation or metadata
/// resolution fails.
pub async fn movie_fuzzy_search<S>(
    session: &mut S,
    ctx: &RequestContext,
    query: &SearchQuery,
    config: &SearchConfig,
) -> Result<Vec<RankedMovie>>
where
    S: SearchSession + ?Sized,
{
    let start = Instant::now();
    query.validate(config.max_limit)?;

    let catalog = session.metadata_types().await?;
    let plan = match build_movie_search(query, &catalog, config) {
        Ok(plan) => plan,
        Err(e) => {
            debug!(
                subsystem = "db",
                component = "movie_search",
                op = "fuzzy_search",
                request_id = %ctx.request_id,
                error = %e,
                "Rejected search"
            );
            return Err(e);
        }
    };

    debug!(
        subsystem = "db",
        component = "movie_search",
        op = "fuzzy_search",
        request_id = %ctx.request_id,
        include_words = plan.include_words,
        excluded_titles = plan.excluded_titles,
        metadata_keys = plan.metadata_keys,
        param_count = plan.statement.params.len(),
        limit = query.limit,
        "Composed search statement"
    );

    let movies = session.fetch_movies(&plan.statement).await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    if duration_ms > SLOW_SEARCH_MS {
        warn!(
            subsystem = "db",
            component = "movie_search",
            op = "fuzzy_search",
            request_id = %ctx.request_id,
            result_count = movies.len(),
            duration_ms,
            slow = true,
            "Slow movie search"
        );
    } else {
        info!(
            subsystem = "db",
            component = "movie_search",
            op = "fuzzy_search",
            request_id = %ctx.request_id,
            result_count = movies.len(),
            duration_ms,
            "Movie search complete"
        );
    }

    Ok(movies)
}

/// PostgreSQL implementation of MovieSearchRepository.
#[derive(Clone)]
pub struct PgMovieSearch {
    pool: Pool<Postgres>,
    config: SearchConfig,
}

impl PgMovieSearch {
    /// Create a new PgMovieSearch with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl MovieSearchRepository for PgMovieSearch {
    async fn fuzzy_search(
        &self,
        ctx: &RequestContext,
        query: &SearchQuery,
    ) -> Result<Vec<RankedMovie>> {
        let start = Instant::now();
        let result = {
            let mut session = PgSearchSession::new(self.pool.clone());
            movie_fuzzy_search(&mut session, ctx, query, &self.config).await
        };
        // Slow searches are most often waiting on a connection
        if start.elapsed().as_millis() as u64 > SLOW_SEARCH_MS {
            log_pool_pressure(&self.pool);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_expr::placeholder_count;
    use mediacat_core::MetadataMatch;

    fn catalog() -> MetadataTypeMap {
        [("genre", 1), ("tag", 2), ("artwork", 3)]
            .into_iter()
            .map(|(name, id)| (name.to_string(), id))
            .collect()
    }

    fn movie(id: i64, title: &str, similarity: f64) -> RankedMovie {
        RankedMovie {
            movie_id: id,
            movie_title: title.to_string(),
            release_year: Some(2000 + id as i32),
            similarity,
        }
    }

    /// Records every round trip; returns canned rows.
    #[derive(Default)]
    struct FakeSession {
        catalog: MetadataTypeMap,
        rows: Vec<RankedMovie>,
        catalog_fetches: usize,
        statements: Vec<RenderedSql>,
        fail_fetch: bool,
    }

    impl FakeSession {
        fn new(rows: Vec<RankedMovie>) -> Self {
            Self {
                catalog: catalog(),
                rows,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SearchSession for FakeSession {
        async fn metadata_types(&mut self) -> Result<MetadataTypeMap> {
            self.catalog_fetches += 1;
            Ok(self.catalog.clone())
        }

        async fn fetch_movies(&mut self, statement: &RenderedSql) -> Result<Vec<RankedMovie>> {
            self.statements.push(statement.clone());
            if self.fail_fetch {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.rows.clone())
        }
    }

    fn plan(query: &SearchQuery) -> MovieSearchPlan {
        build_movie_search(query, &catalog(), &SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_full_statement_with_words() {
        let query = SearchQuery::new().with_terms(["batman"]).with_limit(5);
        let statement = plan(&query).statement;

        assert_eq!(
            statement.sql,
            "SELECT q1.movie_id, q1.movie_title, q1.release_year, q1.similarity \
             FROM (SELECT t.movie_id::int8 AS movie_id, t.movie_title::text AS movie_title, \
             t.release_year::int4 AS release_year, \
             total_similarity(t.title_words, $1::varchar[])::float8 AS similarity \
             FROM mediaserver.movie AS t WHERE TRUE \
             ORDER BY similarity DESC, t.movie_id LIMIT $2) AS q1 \
             WHERE TRUE ORDER BY q1.similarity DESC, q1.movie_id"
        );
        assert_eq!(
            statement.params,
            vec![
                QueryParam::StringArray(vec!["batman".to_string()]),
                QueryParam::BigInt(5)
            ]
        );
    }

    #[test]
    fn test_no_words_scores_constant_one() {
        let query = SearchQuery::new().with_terms(["-batman"]);
        let statement = plan(&query).statement;

        assert!(statement.sql.contains("1::float8 AS similarity"));
        assert!(!statement.sql.contains("total_similarity"));
        assert!(statement
            .sql
            .contains("WHERE lower(t.movie_title) <> lower($1) ORDER BY"));
        assert_eq!(
            statement.params,
            vec![QueryParam::text("batman"), QueryParam::BigInt(10)]
        );
    }

    #[test]
    fn test_parameter_order() {
        let query = SearchQuery::new()
            .with_terms(["dark", "-batman", "knight", "-robin"])
            .with_metadata("tag", ["cult"])
            .with_metadata("genre", ["drama", "-horror"])
            .with_limit(7);
        let built = plan(&query);

        assert_eq!(built.include_words, 2);
        assert_eq!(built.excluded_titles, 2);
        assert_eq!(built.metadata_keys, 2);
        assert_eq!(
            built.statement.params,
            vec![
                QueryParam::StringArray(vec!["dark".to_string(), "knight".to_string()]),
                QueryParam::text("batman"),
                QueryParam::text("robin"),
                QueryParam::BigInt(7),
                // genre sorts before tag
                QueryParam::text("drama"),
                QueryParam::Int(1),
                QueryParam::text("horror"),
                QueryParam::text("cult"),
                QueryParam::Int(2),
            ]
        );
        assert_eq!(
            placeholder_count(&built.statement.sql),
            built.statement.params.len()
        );
        // Metadata keys combine with OR by default
        assert!(built.statement.sql.contains("), FALSE) OR COALESCE("));
    }

    #[test]
    fn test_metadata_filter_applies_after_limit() {
        let query = SearchQuery::new().with_metadata("genre", ["-horror"]);
        let sql = plan(&query).statement.sql;

        let limit_at = sql.find("LIMIT $1").unwrap();
        let metadata_at = sql.find("mediaserver.metadata").unwrap();
        assert!(limit_at < metadata_at);
        assert!(sql.contains(") AS q1 WHERE COALESCE("));
    }

    #[test]
    fn test_metadata_match_all() {
        let query = SearchQuery::new()
            .with_metadata("genre", ["drama"])
            .with_metadata("tag", ["cult"]);
        let config = SearchConfig::new().metadata_match(MetadataMatch::All);
        let sql = build_movie_search(&query, &catalog(), &config)
            .unwrap()
            .statement
            .sql;
        assert!(sql.contains("), FALSE) AND COALESCE("));
    }

    #[test]
    fn test_min_similarity_is_last_parameter() {
        let query = SearchQuery::new()
            .with_terms(["batman"])
            .with_metadata("genre", ["drama"]);
        let config = SearchConfig::new().min_similarity(Some(0.7));
        let statement = build_movie_search(&query, &catalog(), &config)
            .unwrap()
            .statement;

        assert!(statement.sql.contains("q1.similarity >= $5"));
        assert_eq!(statement.params.last(), Some(&QueryParam::Float(0.7)));
        assert_eq!(statement.params.len(), 5);
    }

    #[test]
    fn test_negated_key_resolves_stripped_name() {
        let query = SearchQuery::new().with_metadata("-genre", ["horror"]);
        let statement = plan(&query).statement;
        assert!(statement.sql.contains("WHERE NOT (COALESCE("));
        assert!(statement.params.contains(&QueryParam::Int(1)));
    }

    #[test]
    fn test_bare_minus_key_is_skipped() {
        let query = SearchQuery::new().with_metadata("-", ["horror"]);
        let built = plan(&query);
        assert_eq!(built.metadata_keys, 0);
        assert!(!built.statement.sql.contains("mediaserver.metadata"));
    }

    #[test]
    fn test_unknown_key_is_client_error() {
        let query = SearchQuery::new().with_metadata("colour", ["red"]);
        let err = build_movie_search(&query, &catalog(), &SearchConfig::default()).unwrap_err();
        match &err {
            Error::InvalidMetadataType(name) => assert_eq!(name, "colour"),
            other => panic!("Expected InvalidMetadataType, got {:?}", other),
        }
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_key_reads_no_movies() {
        let mut session = FakeSession::new(vec![movie(1, "Batman", 1.0)]);
        let query = SearchQuery::new()
            .with_terms(["batman"])
            .with_metadata("genre", ["drama"])
            .with_metadata("unknown_key", ["x"]);

        let result =
            movie_fuzzy_search(&mut session, &RequestContext::new(), &query, &SearchConfig::default())
                .await;

        assert!(matches!(result, Err(Error::InvalidMetadataType(_))));
        assert_eq!(session.catalog_fetches, 1);
        assert!(session.statements.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_limit_touches_no_storage() {
        let mut session = FakeSession::new(vec![]);
        let query = SearchQuery::new().with_terms(["batman"]).with_limit(0);

        let result =
            movie_fuzzy_search(&mut session, &RequestContext::new(), &query, &SearchConfig::default())
                .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(session.catalog_fetches, 0);
        assert!(session.statements.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_fetched_every_call() {
        let mut session = FakeSession::new(vec![]);
        let query = SearchQuery::new().with_terms(["batman"]);
        let ctx = RequestContext::new();
        let config = SearchConfig::default();

        movie_fuzzy_search(&mut session, &ctx, &query, &config)
            .await
            .unwrap();
        session.catalog.insert("mood".to_string(), 4);
        let moody = query.clone().with_metadata("mood", ["tense"]);
        movie_fuzzy_search(&mut session, &ctx, &moody, &config)
            .await
            .unwrap();

        assert_eq!(session.catalog_fetches, 2);
        assert_eq!(session.statements.len(), 2);
    }

    #[tokio::test]
    async fn test_identical_inputs_identical_statements_and_rows() {
        let rows = vec![movie(2, "Batman Returns", 0.9), movie(1, "Batman", 0.8)];
        let mut session = FakeSession::new(rows.clone());
        let query = SearchQuery::new()
            .with_terms(["batman", "-joker"])
            .with_metadata("tag", ["cult", "-bad"])
            .with_metadata("genre", ["action"]);
        let ctx = RequestContext::new();
        let config = SearchConfig::default();

        let first = movie_fuzzy_search(&mut session, &ctx, &query, &config)
            .await
            .unwrap();
        let second = movie_fuzzy_search(&mut session, &ctx, &query, &config)
            .await
            .unwrap();

        assert_eq!(first, rows);
        assert_eq!(first, second);
        assert_eq!(session.statements[0], session.statements[1]);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut session = FakeSession::new(vec![movie(1, "Batman", 1.0)]);
        session.fail_fetch = true;
        let query = SearchQuery::new().with_terms(["batman"]);

        let result =
            movie_fuzzy_search(&mut session, &RequestContext::new(), &query, &SearchConfig::default())
                .await;

        match result {
            Err(e) => assert!(!e.is_client_error()),
            Ok(rows) => panic!("Expected error, got {} rows", rows.len()),
        }
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let mut session = FakeSession::new(vec![]);
        let query = SearchQuery::new().with_terms(["zzzz"]);
        let rows =
            movie_fuzzy_search(&mut session, &RequestContext::new(), &query, &SearchConfig::default())
                .await
                .unwrap();
        assert!(rows.is_empty());
    }
}
