//! SELECT builder with joins, ordering and paging.
//!
//! `.all()` expands to the table-qualified columns of the base table followed by
//! those of every joined table, so each result position maps to one exact
//! [`ColumnRef`]. Rows can then be decoded into any of the joined record types.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, SqlQb};
use crate::record::{Field, Record};
use crate::row::{ColumnRef, Row};
use crate::schema::TableSchema;
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

type SchemaFn = fn() -> OrmResult<&'static TableSchema>;

#[derive(Debug)]
struct Join {
    kind: JoinKind,
    table: &'static str,
    schema: SchemaFn,
    on: Expr,
}

/// Start of a SELECT: `select().all().from::<R>()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectStart;

impl SelectStart {
    /// Project every column of every table in the statement.
    pub fn all(self) -> Self {
        self
    }

    /// Set the base table.
    pub fn from<R: Record>(self) -> SelectQb<R> {
        SelectQb::new()
    }
}

/// SELECT from the table of record `R`.
#[derive(Debug)]
pub struct SelectQb<R> {
    joins: Vec<Join>,
    where_group: ExprGroup,
    order_by: Vec<(ColumnRef, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SelectQb<R> {
    pub fn new() -> Self {
        Self {
            joins: Vec::new(),
            where_group: ExprGroup::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            _record: PhantomData,
        }
    }

    /// `INNER JOIN S ON <on>`. Joins render in call order.
    pub fn join<S: Record>(self, on: Expr) -> Self {
        self.push_join::<S>(JoinKind::Inner, on)
    }

    /// `LEFT JOIN S ON <on>`. Unmatched rows carry NULL in every column of `S`.
    pub fn left_join<S: Record>(self, on: Expr) -> Self {
        self.push_join::<S>(JoinKind::Left, on)
    }

    fn push_join<S: Record>(mut self, kind: JoinKind, on: Expr) -> Self {
        self.joins.push(Join {
            kind,
            table: S::TABLE,
            schema: S::schema,
            on,
        });
        self
    }

    /// Add a WHERE predicate. Repeated calls are ANDed.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }

    /// Append an ORDER BY term; `field` may belong to any table of the statement.
    pub fn order_by<S: Record, T>(mut self, field: Field<S, T>, order: Order) -> Self {
        self.order_by.push((field.column_ref(), order));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Execute and return the raw rows.
    pub fn run(self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        let query = self.build()?;
        conn.query_built(&query)
    }

    /// Execute and decode every row as `D`, which may be the base or a joined record.
    pub fn run_decoding<D: Record>(self, conn: &impl GenericClient) -> OrmResult<Vec<D>> {
        self.run(conn)?.iter().map(Row::decode::<D>).collect()
    }

    /// Execute and map every row with `f`, e.g. to decode several records per joined row.
    pub fn run_with<T, F>(self, conn: &impl GenericClient, f: F) -> OrmResult<Vec<T>>
    where
        F: FnMut(&Row) -> OrmResult<T>,
    {
        self.run(conn)?.iter().map(f).collect()
    }

    /// Execute with `LIMIT 1` and decode the first row, if any.
    pub fn first_decoding<D: Record>(self, conn: &impl GenericClient) -> OrmResult<Option<D>> {
        self.limit(1)
            .run(conn)?
            .first()
            .map(Row::decode::<D>)
            .transpose()
    }

    fn projection(&self) -> OrmResult<Vec<ColumnRef>> {
        let mut columns = R::schema()?.column_refs();
        for join in &self.joins {
            let repeats = self.joins.iter().filter(|j| j.table == join.table).count();
            if join.table == R::TABLE || repeats > 1 {
                return Err(OrmError::builder(format!(
                    "SELECT: table {} appears more than once",
                    join.table
                )));
            }
            columns.extend((join.schema)()?.column_refs());
        }
        Ok(columns)
    }
}

impl<R: Record> Default for SelectQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for SelectQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        let columns = self.projection()?;
        if let Some(err) = self
            .joins
            .iter()
            .find_map(|join| join.on.encode_error())
            .or_else(|| self.where_group.encode_error())
        {
            return Err(err);
        }
        let mut params = ParamList::new();

        // WHERE values bind before JOIN ... ON values even though JOIN comes first in the text.
        let mut where_sql = String::new();
        self.where_group.write_where(&mut where_sql, &mut params);
        let mut join_sql = String::new();
        for join in &self.joins {
            join_sql.push(' ');
            join_sql.push_str(join.kind.as_str());
            join_sql.push(' ');
            ident::write_ident(&mut join_sql, join.table);
            join_sql.push_str(" ON ");
            join.on.write(&mut join_sql, &mut params);
        }

        let mut sql = String::from("SELECT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            ident::write_qualified(&mut sql, column.table(), column.column());
        }
        sql.push_str(" FROM ");
        ident::write_ident(&mut sql, R::TABLE);
        sql.push_str(&join_sql);
        sql.push_str(&where_sql);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (column, order)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ident::write_qualified(&mut sql, column.table(), column.column());
                sql.push(' ');
                sql.push_str(order.as_str());
            }
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                let _ = write!(sql, " LIMIT {limit} OFFSET {offset}");
            }
            (Some(limit), None) => {
                let _ = write!(sql, " LIMIT {limit}");
            }
            (None, Some(offset)) => {
                let _ = write!(sql, " LIMIT -1 OFFSET {offset}");
            }
            (None, None) => {}
        }

        Ok(BuiltQuery::new(sql, params.into_vec()).with_columns(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::expr::or;
    use crate::qb::tests::{Galaxy, Planet};
    use crate::value::Value;

    #[test]
    fn all_expands_to_qualified_columns() {
        let q = SelectStart.all().from::<Galaxy>().build().unwrap();
        assert_eq!(q.sql, "SELECT Galaxy.id, Galaxy.name FROM Galaxy");
        assert_eq!(
            q.columns,
            Some(vec![
                ColumnRef::new("Galaxy", "id"),
                ColumnRef::new("Galaxy", "name")
            ])
        );
    }

    #[test]
    fn where_binds_before_join_on() {
        let q = SelectStart
            .all()
            .from::<Planet>()
            .join::<Galaxy>(
                Planet::GALAXY_ID
                    .eq_field(Galaxy::ID)
                    .and(Galaxy::NAME.ne("Andromeda")),
            )
            .filter(Planet::NAME.eq("Mars"))
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "SELECT Planet.id, Planet.galaxyID, Planet.name, Galaxy.id, Galaxy.name \
             FROM Planet INNER JOIN Galaxy ON Planet.galaxyID = Galaxy.id AND Galaxy.name != ?2 \
             WHERE Planet.name = ?1"
        );
        assert_eq!(
            q.params,
            vec![Value::Text("Mars".into()), Value::Text("Andromeda".into())]
        );
    }

    #[test]
    fn order_limit_and_offset() {
        let sql = SelectStart
            .all()
            .from::<Planet>()
            .filter(or([Planet::NAME.eq("Mars"), Planet::NAME.eq("Venus")]))
            .order_by(Planet::NAME, Order::Desc)
            .limit(2)
            .offset(1)
            .to_sql()
            .unwrap();
        assert!(sql.ends_with(
            "WHERE (Planet.name = ?1 OR Planet.name = ?2) ORDER BY Planet.name DESC LIMIT 2 OFFSET 1"
        ));

        let sql = SelectStart.all().from::<Galaxy>().offset(3).to_sql().unwrap();
        assert!(sql.ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn joining_the_same_table_twice_is_rejected() {
        let err = SelectStart
            .all()
            .from::<Planet>()
            .join::<Planet>(Planet::ID.is_not_null())
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Builder(_)));
    }
}
