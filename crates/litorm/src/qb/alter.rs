//! ALTER TABLE builder.

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::{Field, Record};
use crate::schema::{ColumnDef, Constraint, SqlType};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
enum AlterAction {
    AddColumn(ColumnDef),
    RenameTo(String),
}

/// ALTER TABLE for the table of record `R`. One action per statement.
///
/// An added column renders its foreign key inline as `REFERENCES`, since the
/// engine accepts no table-level constraints in `ADD COLUMN`.
#[derive(Debug)]
pub struct AlterTableQb<R> {
    action: Option<AlterAction>,
    error: Option<OrmError>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> AlterTableQb<R> {
    pub fn new() -> Self {
        Self {
            action: None,
            error: None,
            _record: PhantomData,
        }
    }

    /// `ADD COLUMN` with an explicit type and constraints.
    pub fn add_column<T>(
        self,
        field: Field<R, T>,
        sql_type: SqlType,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let def = ColumnDef::new(field.name(), field.column_name(), sql_type, constraints);
        self.set_action(AlterAction::AddColumn(def))
    }

    /// `ADD COLUMN` as declared in the record's descriptor.
    pub fn add_field<T>(mut self, field: Field<R, T>) -> Self {
        match R::schema().and_then(|s| s.column_def(field).cloned()) {
            Ok(def) => self.set_action(AlterAction::AddColumn(def)),
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }

    /// `RENAME TO new_name`
    pub fn rename_to(self, new_name: impl Into<String>) -> Self {
        self.set_action(AlterAction::RenameTo(new_name.into()))
    }

    fn set_action(mut self, action: AlterAction) -> Self {
        if self.action.is_some() {
            self.error.get_or_insert(OrmError::builder(format!(
                "ALTER TABLE {} takes a single action per statement",
                R::TABLE
            )));
        } else {
            self.action = Some(action);
        }
        self
    }
}

impl<R: Record> Default for AlterTableQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for AlterTableQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let Some(action) = &self.action else {
            return Err(OrmError::builder(format!(
                "ALTER TABLE {} has no action",
                R::TABLE
            )));
        };
        ident::validate(R::TABLE)?;

        let mut sql = String::from("ALTER TABLE ");
        ident::write_ident(&mut sql, R::TABLE);
        match action {
            AlterAction::AddColumn(def) => {
                ident::validate(def.column)?;
                sql.push_str(" ADD COLUMN ");
                def.write_definition(&mut sql, true);
            }
            AlterAction::RenameTo(name) => {
                ident::validate(name)?;
                sql.push_str(" RENAME TO ");
                ident::write_ident(&mut sql, name);
            }
        }
        Ok(BuiltQuery::new(sql, Vec::new()))
    }
}

impl<R: Record> MutationQb for AlterTableQb<R> {}
