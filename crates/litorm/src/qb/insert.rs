//! INSERT builder.

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::{Encoder, Record};
use crate::schema::ColumnDef;
use crate::value::Value;

/// Conflict resolution for `INSERT OR ...`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictResolution {
    Abort,
    Fail,
    Ignore,
    Replace,
    Rollback,
}

impl ConflictResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolution::Abort => "ABORT",
            ConflictResolution::Fail => "FAIL",
            ConflictResolution::Ignore => "IGNORE",
            ConflictResolution::Replace => "REPLACE",
            ConflictResolution::Rollback => "ROLLBACK",
        }
    }
}

/// INSERT of one or more records of type `R`.
///
/// Records are encoded when added. The column list holds every descriptor column
/// that some record encoded, except the auto-increment primary key when it is NULL
/// in every record; the engine then assigns it. Columns missing from a record bind
/// NULL for that record.
pub struct InsertQb<R> {
    rows: Vec<Encoder<R>>,
    conflict: Option<ConflictResolution>,
}

impl<R: Record> InsertQb<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            conflict: None,
        }
    }

    /// Add one record.
    pub fn value(mut self, record: &R) -> Self {
        self.rows.push(Encoder::encode(record));
        self
    }

    /// Add several records, in order.
    pub fn values<'a>(mut self, records: impl IntoIterator<Item = &'a R>) -> Self {
        self.rows.extend(records.into_iter().map(Encoder::encode));
        self
    }

    /// `INSERT OR <resolution>`
    pub fn on_conflict(mut self, resolution: ConflictResolution) -> Self {
        self.conflict = Some(resolution);
        self
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn included(&self, column: &ColumnDef) -> bool {
        let auto = column.is_auto_increment();
        self.rows.iter().any(|row| match row.get(column.field) {
            Some(v) => !(auto && v.is_null()),
            None => false,
        })
    }
}

impl<R: Record> Default for InsertQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for InsertQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        let schema = R::schema()?;
        if self.rows.is_empty() {
            return Err(OrmError::builder(format!(
                "INSERT INTO {} requires at least one record",
                R::TABLE
            )));
        }
        if let Some(err) = self.rows.iter().find_map(Encoder::error) {
            return Err(err.clone());
        }
        for row in &self.rows {
            if let Some((field, _)) = row
                .iter()
                .find(|(field, _)| schema.column_by_field(field).is_none())
            {
                return Err(OrmError::builder(format!(
                    "INSERT INTO {}: field '{field}' is not declared in the descriptor",
                    R::TABLE
                )));
            }
        }

        let columns: Vec<&ColumnDef> = schema
            .columns()
            .iter()
            .filter(|c| self.included(c))
            .collect();

        let mut sql = String::from("INSERT ");
        if let Some(resolution) = self.conflict {
            sql.push_str("OR ");
            sql.push_str(resolution.as_str());
            sql.push(' ');
        }
        sql.push_str("INTO ");
        ident::write_ident(&mut sql, R::TABLE);

        if columns.is_empty() {
            if self.rows.len() > 1 {
                return Err(OrmError::builder(format!(
                    "INSERT INTO {}: cannot insert several records without any column values",
                    R::TABLE
                )));
            }
            sql.push_str(" DEFAULT VALUES");
            return Ok(BuiltQuery::new(sql, Vec::new()));
        }

        sql.push_str(" (");
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            ident::write_ident(&mut sql, col.column);
        }
        sql.push_str(") VALUES ");

        let mut params = ParamList::new();
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (i, col) in columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let value = row.get(col.field).cloned().unwrap_or(Value::Null);
                params.bind(&mut sql, value);
            }
            sql.push(')');
        }

        Ok(BuiltQuery::new(sql, params.into_vec()))
    }
}

impl<R: Record> MutationQb for InsertQb<R> {}
