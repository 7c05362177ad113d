//! Result rows addressed by `(table, column)` and the decoding traits built on them.
//!
//! Every value in a [`Row`] is tagged with the [`ColumnRef`] it came from. Builder
//! queries know the origin table of each projected column; for hand-written SQL the
//! engine reports it, and only computed columns are unqualified (empty table).
//!
//! Decoding resolves a column by the exact `(table, column)` pair first and only
//! falls back to an unqualified column of the same name when that pair is absent.
//! A joined row holding `Planet.id` and `Galaxy.id` therefore always gives each
//! record its own `id`.

use crate::error::{OrmError, OrmResult};
use crate::record::{Field, Record};
use crate::value::{FromValue, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A `(table, column)` pair. An empty table means the origin is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    table: Cow<'static, str>,
    column: Cow<'static, str>,
}

impl ColumnRef {
    pub fn new(table: impl Into<Cow<'static, str>>, column: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// A column of unknown origin, as returned by hand-written SQL.
    pub fn unqualified(column: impl Into<Cow<'static, str>>) -> Self {
        Self::new("", column)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_qualified(&self) -> bool {
        !self.table.is_empty()
    }

    fn is(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}.{}", self.table, self.column)
        } else {
            f.write_str(&self.column)
        }
    }
}

/// One result tuple.
///
/// Rows of the same result set share their column header.
#[derive(Clone, PartialEq)]
pub struct Row {
    columns: Arc<[ColumnRef]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[ColumnRef]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Build a row from explicit column/value pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ColumnRef, Value)>) -> Self {
        let (columns, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Columns in result order.
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Values in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &Value)> {
        self.columns.iter().zip(self.values.iter())
    }

    /// Value at a result position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value for exactly this column reference.
    pub fn get(&self, column: &ColumnRef) -> Option<&Value> {
        self.get_qualified(column.table(), column.column())
    }

    /// Value for exactly `(table, column)`, with no fallback.
    pub fn get_qualified(&self, table: &str, column: &str) -> Option<&Value> {
        self.position(table, column).map(|i| &self.values[i])
    }

    /// Value of the first column named `column`, whatever its table.
    ///
    /// Meant for hand-written single-table SQL; joined rows should go through
    /// [`decode`](Self::decode) or [`get_qualified`](Self::get_qualified).
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.iter()
            .find(|(c, _)| c.column() == column)
            .map(|(_, v)| v)
    }

    /// Resolve `(table, column)`, falling back to an unqualified column of that name.
    pub fn resolve(&self, table: &str, column: &str) -> Option<&Value> {
        self.get_qualified(table, column).or_else(|| {
            if table.is_empty() {
                None
            } else {
                self.get_qualified("", column)
            }
        })
    }

    /// Decode the columns of `R::TABLE` into a record.
    pub fn decode<R: Record>(&self) -> OrmResult<R> {
        self.decode_as(R::TABLE)
    }

    /// Decode with an explicit table qualifier.
    pub fn decode_as<T: FromRow>(&self, table: &str) -> OrmResult<T> {
        T::from_row(&RowDecoder::new(self, table))
    }

    fn position(&self, table: &str, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.is(table, column))
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(c, v)| (c.to_string(), v)))
            .finish()
    }
}

/// A view of a [`Row`] scoped to one table.
#[derive(Debug, Clone, Copy)]
pub struct RowDecoder<'r> {
    row: &'r Row,
    table: &'r str,
}

impl<'r> RowDecoder<'r> {
    pub fn new(row: &'r Row, table: &'r str) -> Self {
        Self { row, table }
    }

    pub fn table(&self) -> &str {
        self.table
    }

    pub fn row(&self) -> &'r Row {
        self.row
    }

    /// Decode the value of `column` in this decoder's table.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .row
            .resolve(self.table, column)
            .ok_or_else(|| OrmError::MissingColumn {
                table: self.table.to_string(),
                column: column.to_string(),
            })?;
        T::from_value(value).map_err(|e| e.at(self.describe(column)))
    }

    /// Like [`get`](Self::get), but a missing column yields `None` instead of an error.
    pub fn get_opt<T: FromValue>(&self, column: &str) -> OrmResult<Option<T>> {
        match self.row.resolve(self.table, column) {
            Some(value) => T::from_value(value)
                .map(Some)
                .map_err(|e| e.at(self.describe(column))),
            None => Ok(None),
        }
    }

    /// Decode the column behind a typed field.
    pub fn field<R, T: FromValue>(&self, field: Field<R, T>) -> OrmResult<T> {
        self.get(field.column_name())
    }

    fn describe(&self, column: &str) -> String {
        if self.table.is_empty() {
            column.to_string()
        } else {
            format!("{}.{}", self.table, column)
        }
    }
}

/// Trait for building a value from the columns of one table in a row.
///
/// Usually derived with `#[derive(FromRow)]` or `#[derive(Record)]`.
///
/// # Example
///
/// ```ignore
/// use litorm::FromRow;
///
/// #[derive(FromRow)]
/// struct Galaxy {
///     id: i64,
///     name: String,
/// }
///
/// let galaxy: Galaxy = row.decode_as("Galaxy")?;
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &RowDecoder<'_>) -> OrmResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn joined() -> Row {
        Row::from_pairs([
            (ColumnRef::new("Planet", "id"), Value::Integer(1)),
            (ColumnRef::new("Planet", "name"), Value::Text("Mars".into())),
            (ColumnRef::new("Galaxy", "id"), Value::Integer(2)),
            (ColumnRef::new("Galaxy", "name"), Value::Text("Milky Way".into())),
        ])
    }

    #[derive(Debug)]
    struct Named {
        id: i64,
        name: String,
    }

    impl FromRow for Named {
        fn from_row(row: &RowDecoder<'_>) -> OrmResult<Self> {
            Ok(Self {
                id: row.get("id")?,
                name: row.get("name")?,
            })
        }
    }

    #[test]
    fn same_named_columns_resolve_by_table() {
        let row = joined();
        let planet: Named = row.decode_as("Planet").unwrap();
        let galaxy: Named = row.decode_as("Galaxy").unwrap();
        assert_eq!((planet.id, planet.name.as_str()), (1, "Mars"));
        assert_eq!((galaxy.id, galaxy.name.as_str()), (2, "Milky Way"));
    }

    #[test]
    fn unqualified_columns_are_a_fallback_only() {
        let row = Row::from_pairs([
            (ColumnRef::unqualified("id"), Value::Integer(9)),
            (ColumnRef::new("Planet", "id"), Value::Integer(1)),
            (ColumnRef::unqualified("name"), Value::Text("raw".into())),
        ]);
        let planet: Named = row.decode_as("Planet").unwrap();
        assert_eq!(planet.id, 1);
        assert_eq!(planet.name, "raw");
    }

    #[test]
    fn qualified_columns_of_other_tables_are_never_used() {
        let row = Row::from_pairs([(ColumnRef::new("Galaxy", "id"), Value::Integer(2))]);
        let err = row.decode_as::<Named>("Planet").unwrap_err();
        assert_eq!(err.to_string(), "Missing column 'Planet.id' in row");
    }

    #[test]
    fn decode_errors_carry_table_and_column() {
        let row = Row::from_pairs([
            (ColumnRef::new("Planet", "id"), Value::Text("one".into())),
            (ColumnRef::new("Planet", "name"), Value::Null),
        ]);
        match row.decode_as::<Named>("Planet") {
            Err(OrmError::TypeMismatch {
                column,
                expected,
                actual,
            }) => {
                assert_eq!(column, "Planet.id");
                assert_eq!(expected, "integer");
                assert_eq!(actual, ValueKind::Text);
            }
            other => panic!("unexpected result: {other:?}", other = other.map(|n| n.id)),
        }
    }

    #[test]
    fn first_value_ignores_table() {
        let row = joined();
        assert_eq!(row.first_value("name"), Some(&Value::Text("Mars".into())));
        assert_eq!(row.first_value("missing"), None);
        assert_eq!(
            row.get(&ColumnRef::new("Galaxy", "name")),
            Some(&Value::Text("Milky Way".into()))
        );
    }

    #[test]
    fn get_opt_tolerates_missing_columns() {
        let row = joined();
        let decoder = RowDecoder::new(&row, "Planet");
        assert_eq!(decoder.get_opt::<i64>("mass").unwrap(), None);
        assert_eq!(decoder.get_opt::<i64>("id").unwrap(), Some(1));
    }

    #[test]
    fn column_ref_display() {
        assert_eq!(ColumnRef::new("Planet", "id").to_string(), "Planet.id");
        assert_eq!(ColumnRef::unqualified("id").to_string(), "id");
    }
}
