//! CREATE TABLE builder.

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::{Field, Record};
use crate::schema::{ColumnDef, Constraint, SqlType};
use std::marker::PhantomData;

/// CREATE TABLE for the table of record `R`.
///
/// Columns are rendered in call order with their constraints in canonical order.
/// Foreign keys become table-level `FOREIGN KEY` clauses after the columns.
#[derive(Debug)]
pub struct CreateTableQb<R> {
    columns: Vec<ColumnDef>,
    if_not_exists: bool,
    error: Option<OrmError>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> CreateTableQb<R> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            if_not_exists: false,
            error: None,
            _record: PhantomData,
        }
    }

    /// Add a column with an explicit type and constraints.
    pub fn column<T>(
        mut self,
        field: Field<R, T>,
        sql_type: SqlType,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        self.columns.push(ColumnDef::new(
            field.name(),
            field.column_name(),
            sql_type,
            constraints,
        ));
        self
    }

    /// Add a column as declared in the record's descriptor.
    pub fn field<T>(mut self, field: Field<R, T>) -> Self {
        match R::schema().and_then(|s| s.column_def(field).cloned()) {
            Ok(def) => self.columns.push(def),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add every column of the record's descriptor, in declaration order.
    pub fn all_fields(mut self) -> Self {
        match R::schema() {
            Ok(schema) => self.columns.extend(schema.columns().iter().cloned()),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    fn fail(&mut self, err: OrmError) {
        self.error.get_or_insert(err);
    }
}

impl<R: Record> Default for CreateTableQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for CreateTableQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.columns.is_empty() {
            return Err(OrmError::builder(format!(
                "CREATE TABLE {} requires at least one column",
                R::TABLE
            )));
        }
        ident::validate(R::TABLE)?;
        for (i, col) in self.columns.iter().enumerate() {
            ident::validate(col.column)?;
            if self.columns[..i]
                .iter()
                .any(|c| c.column.eq_ignore_ascii_case(col.column))
            {
                return Err(OrmError::builder(format!(
                    "CREATE TABLE {}: duplicate column '{}'",
                    R::TABLE,
                    col.column
                )));
            }
        }

        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        ident::write_ident(&mut sql, R::TABLE);
        sql.push_str(" (");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            col.write_definition(&mut sql, false);
        }
        for col in &self.columns {
            if let Some(fk) = col.foreign_key() {
                sql.push_str(", FOREIGN KEY (");
                ident::write_ident(&mut sql, col.column);
                sql.push_str(") ");
                fk.write_references(&mut sql);
            }
        }
        sql.push(')');

        Ok(BuiltQuery::new(sql, Vec::new()))
    }
}

impl<R: Record> MutationQb for CreateTableQb<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::tests::{Galaxy, Planet};
    use crate::schema::ForeignKeyAction;

    #[test]
    fn explicit_columns_render_in_call_order() {
        let sql = CreateTableQb::<Galaxy>::new()
            .column(Galaxy::ID, SqlType::Integer, [Constraint::primary_key()])
            .column(Galaxy::NAME, SqlType::Text, [Constraint::NotNull])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE Galaxy (id INTEGER PRIMARY KEY, name TEXT NOT NULL)"
        );
    }

    #[test]
    fn foreign_keys_follow_column_definitions() {
        let sql = CreateTableQb::<Planet>::new()
            .all_fields()
            .if_not_exists()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS Planet (id INTEGER PRIMARY KEY, \
             galaxyID INTEGER NOT NULL, name TEXT NOT NULL DEFAULT 'Unamed Planet', \
             FOREIGN KEY (galaxyID) REFERENCES Galaxy (id))"
        );
    }

    #[test]
    fn referential_actions_are_rendered() {
        let sql = CreateTableQb::<Planet>::new()
            .field(Planet::ID)
            .column(
                Planet::GALAXY_ID,
                SqlType::Integer,
                [crate::schema::ForeignKey::to(Galaxy::ID)
                    .on_delete(ForeignKeyAction::Cascade)
                    .into()],
            )
            .to_sql()
            .unwrap();
        assert!(sql.ends_with(
            "FOREIGN KEY (galaxyID) REFERENCES Galaxy (id) ON DELETE CASCADE)"
        ));
    }

    #[test]
    fn zero_columns_is_a_builder_error() {
        let err = CreateTableQb::<Galaxy>::new().build().unwrap_err();
        assert!(matches!(err, OrmError::Builder(_)));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = CreateTableQb::<Galaxy>::new()
            .field(Galaxy::NAME)
            .field(Galaxy::NAME)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate column 'name'"));
    }
}
