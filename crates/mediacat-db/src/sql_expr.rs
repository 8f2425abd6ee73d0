//! Parameterized SQL expression tree.
//!
//! Dynamic WHERE clauses are built as a small tree of boolean nodes and
//! rendered in a single pass that emits `$n` placeholder text and the matching
//! parameter list together, so text and parameters cannot drift apart.
//!
//! Only `&'static str` skeleton text is ever written verbatim into a
//! statement. Every caller-supplied value travels as a [`QueryParam`].
//!
//! ```rust,ignore
//! use mediacat_db::sql_expr::{CompareOp, QueryParam, SqlExpr};
//!
//! let expr = SqlExpr::and([
//!     SqlExpr::compare(
//!         SqlExpr::sql("lower(t.movie_title)"),
//!         CompareOp::NotEq,
//!         SqlExpr::seq([SqlExpr::sql("lower("), SqlExpr::param(QueryParam::text("up")), SqlExpr::sql(")")]),
//!     ),
//!     SqlExpr::in_list(SqlExpr::sql("mt.md_value"), [QueryParam::text("drama")]),
//! ]);
//! let rendered = expr.render();
//! // rendered.sql: "(lower(t.movie_title) <> lower($1) AND mt.md_value IN ($2))"
//! ```

use std::fmt::Write;

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// 32-bit integer (catalog identifiers).
    Int(i32),
    /// 64-bit integer (limits).
    BigInt(i64),
    /// Double precision (similarity thresholds).
    Float(f64),
    /// Text parameter.
    String(String),
    /// Array of text (bound as a single `text[]` parameter).
    StringArray(Vec<String>),
}

impl QueryParam {
    pub fn text(value: impl Into<String>) -> Self {
        QueryParam::String(value.into())
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    NotEq,
    GtEq,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::NotEq => " <> ",
            CompareOp::GtEq => " >= ",
        }
    }
}

/// A boolean (or scalar) SQL expression with its parameters embedded.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    True,
    /// Static skeleton text.
    Sql(&'static str),
    /// One positional placeholder.
    Param(QueryParam),
    /// Concatenation of sub-expressions, no separators added.
    Seq(Vec<SqlExpr>),
    Compare {
        lhs: Box<SqlExpr>,
        op: CompareOp,
        rhs: Box<SqlExpr>,
    },
    /// `lhs IN ($a, $b, ...)`.
    InList {
        lhs: Box<SqlExpr>,
        values: Vec<QueryParam>,
    },
    And(Vec<SqlExpr>),
    Or(Vec<SqlExpr>),
    Not(Box<SqlExpr>),
}

impl SqlExpr {
    pub fn sql(text: &'static str) -> Self {
        SqlExpr::Sql(text)
    }

    pub fn param(param: QueryParam) -> Self {
        SqlExpr::Param(param)
    }

    pub fn seq(parts: impl IntoIterator<Item = SqlExpr>) -> Self {
        SqlExpr::Seq(parts.into_iter().collect())
    }

    pub fn compare(lhs: SqlExpr, op: CompareOp, rhs: SqlExpr) -> Self {
        SqlExpr::Compare {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn in_list(lhs: SqlExpr, values: impl IntoIterator<Item = QueryParam>) -> Self {
        SqlExpr::InList {
            lhs: Box::new(lhs),
            values: values.into_iter().collect(),
        }
    }

    /// Conjunction. An empty conjunction renders as `TRUE`.
    pub fn and(children: impl IntoIterator<Item = SqlExpr>) -> Self {
        SqlExpr::And(children.into_iter().collect())
    }

    /// Disjunction. An empty disjunction renders as `FALSE`.
    pub fn or(children: impl IntoIterator<Item = SqlExpr>) -> Self {
        SqlExpr::Or(children.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: SqlExpr) -> Self {
        SqlExpr::Not(Box::new(expr))
    }

    /// Number of placeholders this expression renders.
    pub fn param_count(&self) -> usize {
        match self {
            SqlExpr::True | SqlExpr::Sql(_) => 0,
            SqlExpr::Param(_) => 1,
            SqlExpr::Seq(parts) | SqlExpr::And(parts) | SqlExpr::Or(parts) => {
                parts.iter().map(SqlExpr::param_count).sum()
            }
            SqlExpr::Compare { lhs, rhs, .. } => lhs.param_count() + rhs.param_count(),
            SqlExpr::InList { values, .. } if values.is_empty() => 0,
            SqlExpr::InList { lhs, values, .. } => lhs.param_count() + values.len(),
            SqlExpr::Not(inner) => inner.param_count(),
        }
    }

    /// Render standalone, numbering placeholders from `$1`.
    pub fn render(&self) -> RenderedSql {
        let mut writer = SqlWriter::new();
        writer.push_expr(self);
        writer.finish()
    }
}

/// Accumulates statement text and its positional parameters in lockstep.
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    params: Vec<QueryParam>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append static skeleton text.
    pub fn push_sql(&mut self, text: &'static str) {
        self.sql.push_str(text);
    }

    /// Append a placeholder bound to `param`.
    pub fn push_param(&mut self, param: QueryParam) {
        self.params.push(param);
        // Writing to a String cannot fail
        let _ = write!(self.sql, "${}", self.params.len());
    }

    /// Append an expression, numbering its placeholders after those already
    /// written.
    pub fn push_expr(&mut self, expr: &SqlExpr) {
        match expr {
            SqlExpr::True => self.push_sql("TRUE"),
            SqlExpr::Sql(text) => self.push_sql(*text),
            SqlExpr::Param(param) => self.push_param(param.clone()),
            SqlExpr::Seq(parts) => {
                for part in parts {
                    self.push_expr(part);
                }
            }
            SqlExpr::Compare { lhs, op, rhs } => {
                self.push_expr(lhs);
                self.push_sql(op.as_sql());
                self.push_expr(rhs);
            }
            SqlExpr::InList { lhs, values } => {
                // `x IN ()` is not valid SQL and nothing is in the empty set
                if values.is_empty() {
                    self.push_sql("FALSE");
                    return;
                }
                self.push_expr(lhs);
                self.push_sql(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.push_param(value.clone());
                }
                self.push_sql(")");
            }
            SqlExpr::And(children) => self.push_junction(children, " AND ", "TRUE"),
            SqlExpr::Or(children) => self.push_junction(children, " OR ", "FALSE"),
            SqlExpr::Not(inner) => {
                self.push_sql("NOT (");
                self.push_expr(inner);
                self.push_sql(")");
            }
        }
    }

    fn push_junction(&mut self, children: &[SqlExpr], op: &'static str, empty: &'static str) {
        match children {
            [] => self.push_sql(empty),
            [only] => self.push_expr(only),
            _ => {
                self.push_sql("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(op);
                    }
                    self.push_expr(child);
                }
                self.push_sql(")");
            }
        }
    }

    /// Number of parameters written so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn finish(self) -> RenderedSql {
        debug_assert_eq!(
            placeholder_count(&self.sql),
            self.params.len(),
            "placeholders and parameters out of step"
        );
        RenderedSql {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Statement (or fragment) text with its ordered bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl RenderedSql {
    /// Build a sqlx query with every parameter bound in order.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        let mut q = sqlx::query(&self.sql);
        for param in &self.params {
            q = match param {
                QueryParam::Int(val) => q.bind(val),
                QueryParam::BigInt(val) => q.bind(val),
                QueryParam::Float(val) => q.bind(val),
                QueryParam::String(s) => q.bind(s),
                QueryParam::StringArray(arr) => q.bind(arr),
            };
        }
        q
    }
}

/// Count `$n` placeholders in statement text.
pub fn placeholder_count(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    bytes
        .windows(2)
        .filter(|w| w[0] == b'$' && w[1].is_ascii_digit())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &'static str) -> SqlExpr {
        SqlExpr::sql(name)
    }

    #[test]
    fn test_empty_and_renders_true() {
        let rendered = SqlExpr::and([]).render();
        assert_eq!(rendered.sql, "TRUE");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_empty_or_renders_false() {
        assert_eq!(SqlExpr::or([]).render().sql, "FALSE");
    }

    #[test]
    fn test_single_child_junction_has_no_parens() {
        let rendered = SqlExpr::and([SqlExpr::compare(
            col("a"),
            CompareOp::GtEq,
            SqlExpr::param(QueryParam::Int(1)),
        )])
        .render();
        assert_eq!(rendered.sql, "a >= $1");
    }

    #[test]
    fn test_nested_junctions() {
        let expr = SqlExpr::or([
            SqlExpr::and([
                SqlExpr::compare(col("a"), CompareOp::GtEq, SqlExpr::param(QueryParam::Int(1))),
                SqlExpr::compare(col("b"), CompareOp::NotEq, SqlExpr::param(QueryParam::Int(2))),
            ]),
            SqlExpr::not(SqlExpr::compare(
                col("c"),
                CompareOp::NotEq,
                SqlExpr::param(QueryParam::text("x")),
            )),
        ]);
        let rendered = expr.render();
        assert_eq!(rendered.sql, "((a >= $1 AND b <> $2) OR NOT (c <> $3))");
        assert_eq!(
            rendered.params,
            vec![
                QueryParam::Int(1),
                QueryParam::Int(2),
                QueryParam::text("x")
            ]
        );
    }

    #[test]
    fn test_in_list() {
        let rendered = SqlExpr::in_list(
            col("v"),
            [QueryParam::text("a"), QueryParam::text("b")],
        )
        .render();
        assert_eq!(rendered.sql, "v IN ($1, $2)");
        assert_eq!(rendered.params.len(), 2);
    }

    #[test]
    fn test_empty_in_list_never_renders_empty_parens() {
        let rendered = SqlExpr::in_list(col("v"), []).render();
        assert_eq!(rendered.sql, "FALSE");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_writer_continues_numbering() {
        let mut writer = SqlWriter::new();
        writer.push_sql("SELECT ");
        writer.push_param(QueryParam::BigInt(5));
        writer.push_sql(" WHERE ");
        writer.push_expr(&SqlExpr::in_list(
            col("x"),
            [QueryParam::Int(1), QueryParam::Int(2)],
        ));
        assert_eq!(writer.param_count(), 3);
        let rendered = writer.finish();
        assert_eq!(rendered.sql, "SELECT $1 WHERE x IN ($2, $3)");
    }

    #[test]
    fn test_param_count_matches_render() {
        let expr = SqlExpr::and([
            SqlExpr::seq([
                SqlExpr::sql("f("),
                SqlExpr::param(QueryParam::StringArray(vec!["a".into(), "b".into()])),
                SqlExpr::sql(")"),
            ]),
            SqlExpr::not(SqlExpr::in_list(
                col("v"),
                [QueryParam::text("a"), QueryParam::text("b")],
            )),
            SqlExpr::in_list(col("w"), []),
        ]);
        let rendered = expr.render();
        assert_eq!(expr.param_count(), 3);
        assert_eq!(placeholder_count(&rendered.sql), rendered.params.len());
        assert_eq!(rendered.params.len(), 3);
    }

    #[test]
    fn test_placeholder_count() {
        assert_eq!(placeholder_count("a = $1 AND b IN ($2, $10)"), 3);
        assert_eq!(placeholder_count("no params"), 0);
        assert_eq!(placeholder_count("cost $ 5"), 0);
    }

    #[test]
    fn test_string_array_is_one_placeholder() {
        let rendered = SqlExpr::seq([
            SqlExpr::sql("total_similarity(t.title_words, "),
            SqlExpr::param(QueryParam::StringArray(vec![
                "dark".into(),
                "knight".into(),
            ])),
            SqlExpr::sql("::varchar[])"),
        ])
        .render();
        assert_eq!(rendered.sql, "total_similarity(t.title_words, $1::varchar[])");
        assert_eq!(rendered.params.len(), 1);
    }
}
