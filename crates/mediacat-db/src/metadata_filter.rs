//! Metadata constraint query builder.
//!
//! Compiles the values given for one metadata type into a boolean fragment
//! evaluated against the ranked candidate set `q1`:
//!
//! > the movie has at least one entry of this type whose value is in the
//! > include set, and no entry of this type whose value is in the exclude set
//!
//! An empty include set makes the first half vacuously true; an empty exclude
//! set drops the second half. Both halves are evaluated by one aggregate
//! subquery so the type identifier is bound once:
//!
//! ```sql
//! COALESCE((SELECT count(*) FILTER (WHERE mt.md_value IN ($1, $2)) > 0
//!           FROM mediaserver.metadata mt
//!           NATURAL JOIN mediaserver.mediaitemmetadata mtm
//!           WHERE mtm.media_id = q1.movie_id AND mt.md_type_id = $3
//!           HAVING count(*) FILTER (WHERE mt.md_value IN ($4)) = 0), FALSE)
//! ```
//!
//! Parameters bind include values, then the type identifier, then exclude
//! values.

use mediacat_core::MetadataValues;

use crate::sql_expr::{QueryParam, SqlExpr};

/// Builds the constraint fragment for one metadata type.
pub struct MetadataConstraintBuilder<'a> {
    type_id: i32,
    values: &'a MetadataValues,
    negated: bool,
}

impl<'a> MetadataConstraintBuilder<'a> {
    /// Create a builder for the given catalog type identifier and values.
    pub fn new(type_id: i32, values: &'a MetadataValues) -> Self {
        Self {
            type_id,
            values,
            negated: false,
        }
    }

    /// Invert the whole constraint (`-genre` keys).
    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Build the fragment.
    ///
    /// A key with no usable values constrains nothing and yields `TRUE`,
    /// negated or not.
    pub fn build(&self) -> SqlExpr {
        if self.values.is_empty() {
            return SqlExpr::True;
        }

        let head = if self.values.include.is_empty() {
            SqlExpr::True
        } else {
            SqlExpr::seq([
                SqlExpr::sql("count(*) FILTER (WHERE "),
                value_in(&self.values.include),
                SqlExpr::sql(") > 0"),
            ])
        };

        let having = if self.values.exclude.is_empty() {
            SqlExpr::seq([])
        } else {
            SqlExpr::seq([
                SqlExpr::sql(" HAVING count(*) FILTER (WHERE "),
                value_in(&self.values.exclude),
                SqlExpr::sql(") = 0"),
            ])
        };

        // Without HAVING the head is an aggregate whenever include values
        // exist, so the subquery always yields exactly one row. With HAVING
        // a rejected group yields no row, hence the COALESCE.
        let constraint = SqlExpr::seq([
            SqlExpr::sql("COALESCE((SELECT "),
            head,
            SqlExpr::sql(
                " FROM mediaserver.metadata mt \
                 NATURAL JOIN mediaserver.mediaitemmetadata mtm \
                 WHERE mtm.media_id = q1.movie_id AND mt.md_type_id = ",
            ),
            SqlExpr::param(QueryParam::Int(self.type_id)),
            having,
            SqlExpr::sql("), FALSE)"),
        ]);

        if self.negated {
            SqlExpr::not(constraint)
        } else {
            constraint
        }
    }
}

fn value_in(values: &[String]) -> SqlExpr {
    SqlExpr::in_list(
        SqlExpr::sql("mt.md_value"),
        values.iter().cloned().map(QueryParam::String),
    )
}

/// Compile one metadata key's values into a constraint fragment.
pub fn compile_metadata_constraint(type_id: i32, values: &MetadataValues, negated: bool) -> SqlExpr {
    MetadataConstraintBuilder::new(type_id, values)
        .negated(negated)
        .build()
}
