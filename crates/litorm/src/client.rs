//! Generic client trait for unified database access.

use crate::error::{OrmError, OrmResult};
use crate::qb::BuiltQuery;
use crate::row::{ColumnRef, Row};
use crate::value::Value;

/// A trait that unifies connections and transactions.
///
/// Builders and repository code accept `&impl GenericClient`, so the same call
/// works on a plain [`Connection`](crate::Connection) or inside a
/// [`Transaction`](crate::Transaction).
pub trait GenericClient {
    /// Execute a statement and return every row.
    ///
    /// `columns` names the origin `(table, column)` of each result position. When
    /// `None`, result columns are addressed by the engine's column names only.
    fn query_raw(
        &self,
        sql: &str,
        params: &[Value],
        columns: Option<&[ColumnRef]>,
    ) -> OrmResult<Vec<Row>>;

    /// Execute a statement and return the number of affected rows.
    fn execute_raw(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Rowid assigned by the most recent successful INSERT on this connection.
    ///
    /// `None` before any insert. The value is connection-scoped: concurrent
    /// inserts on one connection must be serialized by the caller.
    fn last_insert_id(&self) -> Option<i64>;

    /// Execute hand-written SQL and return every row.
    fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.query_raw(sql, params, None)
    }

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns the first row (does **not** error)
    fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        self.query(sql, params)?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute hand-written SQL and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.execute_raw(sql, params)
    }

    /// Execute a built statement that returns no rows.
    fn run_built(&self, query: &BuiltQuery) -> OrmResult<u64> {
        self.execute_raw(&query.sql, &query.params)
    }

    /// Execute a built statement, addressing result columns by the origins it carries.
    fn query_built(&self, query: &BuiltQuery) -> OrmResult<Vec<Row>> {
        self.query_raw(&query.sql, &query.params, query.columns.as_deref())
    }
}

impl<C: GenericClient + ?Sized> GenericClient for &C {
    fn query_raw(
        &self,
        sql: &str,
        params: &[Value],
        columns: Option<&[ColumnRef]>,
    ) -> OrmResult<Vec<Row>> {
        (**self).query_raw(sql, params, columns)
    }

    fn execute_raw(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        (**self).execute_raw(sql, params)
    }

    fn last_insert_id(&self) -> Option<i64> {
        (**self).last_insert_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every statement and answers queries from a canned row set.
    #[derive(Default)]
    struct Recorder {
        statements: RefCell<Vec<(String, Vec<Value>)>>,
        rows: Vec<Row>,
    }

    impl GenericClient for Recorder {
        fn query_raw(
            &self,
            sql: &str,
            params: &[Value],
            _columns: Option<&[ColumnRef]>,
        ) -> OrmResult<Vec<Row>> {
            self.statements
                .borrow_mut()
                .push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }

        fn execute_raw(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
            self.statements
                .borrow_mut()
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        fn last_insert_id(&self) -> Option<i64> {
            None
        }
    }

    #[test]
    fn query_one_reports_not_found_on_empty_result() {
        let client = Recorder::default();
        let err = client.query_one("SELECT 1 WHERE 0", &[]).unwrap_err();
        assert!(err.is_not_found());
        assert!(client.query_opt("SELECT 1 WHERE 0", &[]).unwrap().is_none());
    }

    #[test]
    fn query_one_returns_first_of_many() {
        let client = Recorder {
            rows: vec![
                Row::from_pairs([(ColumnRef::unqualified("n"), Value::Integer(1))]),
                Row::from_pairs([(ColumnRef::unqualified("n"), Value::Integer(2))]),
            ],
            ..Default::default()
        };
        let row = client.query_one("SELECT n FROM t", &[]).unwrap();
        assert_eq!(row.first_value("n"), Some(&Value::Integer(1)));
    }

    #[test]
    fn run_built_passes_sql_and_params_through() {
        let client = Recorder::default();
        let query = BuiltQuery::new("DELETE FROM t WHERE id = ?1".into(), vec![Value::Integer(7)]);
        assert_eq!((&client).run_built(&query).unwrap(), 1);
        assert_eq!(
            client.statements.borrow()[0],
            ("DELETE FROM t WHERE id = ?1".to_string(), vec![Value::Integer(7)])
        );
    }
}
