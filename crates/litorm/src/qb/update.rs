//! UPDATE builder.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::{Field, Record};
use crate::value::{ToValue, Value};
use std::marker::PhantomData;

/// UPDATE of the table of record `R`.
///
/// Keys passed to [`set`](Self::set) are column names, checked against the
/// descriptor when the statement is built.
///
/// **Hazard:** without a [`filter`](Self::filter) the statement updates every row
/// of the table. This is allowed; running it logs a WARN.
#[derive(Debug)]
pub struct UpdateQb<R> {
    sets: Vec<(String, Value)>,
    where_group: ExprGroup,
    error: Option<OrmError>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> UpdateQb<R> {
    pub fn new() -> Self {
        Self {
            sets: Vec::new(),
            where_group: ExprGroup::new(),
            error: None,
            _record: PhantomData,
        }
    }

    /// `SET column = value`. Setting the same column again replaces the value.
    pub fn set(mut self, column: impl Into<String>, value: impl ToValue) -> Self {
        let column = column.into();
        let value = match value.to_value() {
            Ok(value) => value,
            Err(e) => {
                self.error.get_or_insert(OrmError::builder(format!(
                    "UPDATE {}: cannot encode value for '{column}': {e}",
                    R::TABLE
                )));
                return self;
            }
        };
        match self.sets.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.sets.push((column, value)),
        }
        self
    }

    /// Set every `(column, value)` pair of `mapping`, in iteration order.
    pub fn set_all<K, V>(self, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToValue,
    {
        mapping
            .into_iter()
            .fold(self, |qb, (column, value)| qb.set(column, value))
    }

    /// `SET` the column behind a typed field.
    pub fn set_field<T: ToValue>(self, field: Field<R, T>, value: impl Into<T>) -> Self {
        self.set(field.column_name(), value.into())
    }

    /// Add a WHERE predicate. Repeated calls are ANDed.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }
}

impl<R: Record> Default for UpdateQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for UpdateQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        let schema = R::schema()?;
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if let Some(err) = self.where_group.encode_error() {
            return Err(err);
        }
        if self.sets.is_empty() {
            return Err(OrmError::builder(format!(
                "UPDATE {}: SET clause cannot be empty",
                R::TABLE
            )));
        }
        if let Some((column, _)) = self
            .sets
            .iter()
            .find(|(c, _)| schema.column_by_name(c).is_none())
        {
            return Err(OrmError::builder(format!(
                "UPDATE {}: unknown column '{column}'",
                R::TABLE
            )));
        }

        let mut params = ParamList::new();
        let mut sql = String::from("UPDATE ");
        ident::write_ident(&mut sql, R::TABLE);
        sql.push_str(" SET ");
        for (i, (column, value)) in self.sets.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            ident::write_ident(&mut sql, column);
            sql.push_str(" = ");
            params.bind(&mut sql, value.clone());
        }

        self.where_group.write_where(&mut sql, &mut params);

        Ok(BuiltQuery::new(sql, params.into_vec()))
    }
}

impl<R: Record> MutationQb for UpdateQb<R> {
    fn run(self, conn: &impl GenericClient) -> OrmResult<u64> {
        let query = self.build()?;
        if self.where_group.is_empty() {
            tracing::warn!(
                target: "litorm::qb",
                table = R::TABLE,
                "UPDATE without a filter affects every row"
            );
        }
        conn.run_built(&query)
    }
}
