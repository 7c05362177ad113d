//! Trait definitions for query builders.

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::monitor::QueryType;
use crate::row::ColumnRef;
use crate::value::Value;

/// A rendered statement: SQL text, bound values and, for builder selects, the
/// origin of every result column.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    /// Values for `?1`, `?2`, ... in order.
    pub params: Vec<Value>,
    /// `(table, column)` of each result position, when known.
    pub columns: Option<Vec<ColumnRef>>,
    pub kind: QueryType,
}

impl BuiltQuery {
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        let kind = QueryType::from_sql(&sql);
        Self {
            sql,
            params,
            columns: None,
            kind,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnRef>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// Base trait for all query builders.
pub trait SqlQb {
    /// Render SQL and bound values, or report the first error recorded while building.
    fn build(&self) -> OrmResult<BuiltQuery>;

    /// Debug helper: the SQL text only.
    fn to_sql(&self) -> OrmResult<String> {
        self.build().map(|q| q.sql)
    }
}

/// Builders for statements that return no rows (DDL, INSERT, UPDATE, DELETE).
pub trait MutationQb: SqlQb + Sized {
    /// Execute and return the number of affected rows (0 for DDL).
    ///
    /// Consumes the builder; nothing is sent when building fails.
    fn run(self, conn: &impl GenericClient) -> OrmResult<u64> {
        let query = self.build()?;
        conn.run_built(&query)
    }
}
