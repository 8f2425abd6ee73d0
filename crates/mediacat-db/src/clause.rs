//! Clause assembly for the two-tier movie search.
//!
//! The ranked inner query filters candidates with the title exclusions; the
//! outer query re-filters the capped candidates with the metadata group.

use mediacat_core::MetadataMatch;

use crate::sql_expr::{CompareOp, QueryParam, SqlExpr};

/// The two WHERE clauses of a movie search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchClauses {
    /// Applied before ranking and the limit (`WHERE` of the inner query).
    pub candidate_filter: SqlExpr,
    /// Applied to the capped candidate set `q1` (`WHERE` of the outer query).
    pub metadata_filter: SqlExpr,
}

/// `lower(t.movie_title) <> lower($n)`
fn title_exclusion(title: &str) -> SqlExpr {
    SqlExpr::compare(
        SqlExpr::sql("lower(t.movie_title)"),
        CompareOp::NotEq,
        SqlExpr::seq([
            SqlExpr::sql("lower("),
            SqlExpr::param(QueryParam::text(title)),
            SqlExpr::sql(")"),
        ]),
    )
}

/// Combine title exclusions and per-key metadata fragments.
///
/// Exclusions are AND-ed: a movie must differ from every excluded title.
/// Metadata fragments are OR-ed across keys under [`MetadataMatch::Any`] and
/// AND-ed under [`MetadataMatch::All`]. Either clause is `TRUE` when it has
/// nothing to test.
pub fn assemble_clauses<S: AsRef<str>>(
    exclude_titles: &[S],
    metadata_fragments: Vec<SqlExpr>,
    mode: MetadataMatch,
) -> SearchClauses {
    let candidate_filter =
        SqlExpr::and(exclude_titles.iter().map(|t| title_exclusion(t.as_ref())));

    let metadata_filter = if metadata_fragments.is_empty() {
        SqlExpr::True
    } else {
        match mode {
            MetadataMatch::Any => SqlExpr::or(metadata_fragments),
            MetadataMatch::All => SqlExpr::and(metadata_fragments),
        }
    };

    SearchClauses {
        candidate_filter,
        metadata_filter,
    }
}
