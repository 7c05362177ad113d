//! Schema descriptors: table name, columns, declared types and constraints.
//!
//! A [`TableSchema`] is built once per record type through [`SchemaBuilder`] and is
//! immutable afterwards. Conflicts (duplicate columns, two primary keys, dangling
//! self-references) are rejected by [`SchemaBuilder::build`], never at execution time.

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::record::{Field, Record};
use crate::row::ColumnRef;
use crate::value::{ColumnType, Value};
use std::marker::PhantomData;

/// Declared SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
    /// A type name passed through verbatim, e.g. `VARCHAR(16)`.
    Custom(&'static str),
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
            SqlType::Numeric => "NUMERIC",
            SqlType::Custom(name) => name,
        }
    }
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Rendered as an SQL literal.
    Literal(Value),
    /// Rendered verbatim inside parentheses, e.g. `CURRENT_TIMESTAMP`.
    Computed(String),
}

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Cascade => "CASCADE",
        }
    }
}

/// Reference from a column to a column of another (or the same) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Reference the column behind `target`.
    ///
    /// Whether the target column is actually a key is checked by the engine when the
    /// statement runs, not here.
    pub fn to<S: Record, U>(target: Field<S, U>) -> Self {
        Self {
            table: S::TABLE,
            column: target.column_name(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub(crate) fn write_references(&self, out: &mut String) {
        out.push_str("REFERENCES ");
        ident::write_ident(out, self.table);
        out.push_str(" (");
        ident::write_ident(out, self.column);
        out.push(')');
        if let Some(action) = self.on_delete {
            out.push_str(" ON DELETE ");
            out.push_str(action.as_str());
        }
        if let Some(action) = self.on_update {
            out.push_str(" ON UPDATE ");
            out.push_str(action.as_str());
        }
    }
}

/// A column constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    PrimaryKey { autoincrement: bool },
    NotNull,
    Unique,
    Default(DefaultValue),
    ForeignKey(ForeignKey),
}

impl Constraint {
    pub fn primary_key() -> Self {
        Constraint::PrimaryKey {
            autoincrement: false,
        }
    }

    /// PRIMARY KEY AUTOINCREMENT: rowids are never reused.
    pub fn primary_key_autoincrement() -> Self {
        Constraint::PrimaryKey { autoincrement: true }
    }

    /// `DEFAULT <literal>`, e.g. `default_literal("Unamed Planet")` or `default_literal(0)`.
    pub fn default_literal(value: impl Into<Value>) -> Self {
        Constraint::Default(DefaultValue::Literal(value.into()))
    }

    pub fn default_expr(sql: impl Into<String>) -> Self {
        Constraint::Default(DefaultValue::Computed(sql.into()))
    }

    pub fn foreign_key<S: Record, U>(target: Field<S, U>) -> Self {
        Constraint::ForeignKey(ForeignKey::to(target))
    }

    /// Position in the canonical rendering order.
    fn rank(&self) -> u8 {
        match self {
            Constraint::PrimaryKey { .. } => 0,
            Constraint::NotNull => 1,
            Constraint::Unique => 2,
            Constraint::Default(_) => 3,
            Constraint::ForeignKey(_) => 4,
        }
    }
}

impl From<ForeignKey> for Constraint {
    fn from(fk: ForeignKey) -> Self {
        Constraint::ForeignKey(fk)
    }
}

/// One column of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Field identifier in the record type.
    pub field: &'static str,
    /// Column name in the table.
    pub column: &'static str,
    pub sql_type: SqlType,
    /// Constraints in canonical order.
    pub constraints: Vec<Constraint>,
}

impl ColumnDef {
    pub fn new(
        field: &'static str,
        column: &'static str,
        sql_type: SqlType,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let mut constraints: Vec<Constraint> = constraints.into_iter().collect();
        constraints.sort_by_key(Constraint::rank);
        Self {
            field,
            column,
            sql_type,
            constraints,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::PrimaryKey { .. }))
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints.contains(&Constraint::NotNull)
    }

    pub fn is_unique(&self) -> bool {
        self.constraints.contains(&Constraint::Unique)
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Default(d) => Some(d),
            _ => None,
        })
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::ForeignKey(fk) => Some(fk),
            _ => None,
        })
    }

    /// An INTEGER primary key is assigned by the engine when inserted as NULL.
    pub fn is_auto_increment(&self) -> bool {
        self.is_primary_key() && self.sql_type == SqlType::Integer
    }

    /// Render `name TYPE [constraints]`.
    ///
    /// With `inline_foreign_key` the reference is rendered as a column-level
    /// `REFERENCES` clause; otherwise it is left for a table-level clause.
    pub(crate) fn write_definition(&self, out: &mut String, inline_foreign_key: bool) {
        ident::write_ident(out, self.column);
        out.push(' ');
        out.push_str(self.sql_type.as_str());
        for constraint in &self.constraints {
            match constraint {
                Constraint::PrimaryKey { autoincrement } => {
                    out.push_str(" PRIMARY KEY");
                    if *autoincrement {
                        out.push_str(" AUTOINCREMENT");
                    }
                }
                Constraint::NotNull => out.push_str(" NOT NULL"),
                Constraint::Unique => out.push_str(" UNIQUE"),
                Constraint::Default(DefaultValue::Literal(value)) => {
                    out.push_str(" DEFAULT ");
                    value.write_sql_literal(out);
                }
                Constraint::Default(DefaultValue::Computed(expr)) => {
                    out.push_str(" DEFAULT (");
                    out.push_str(expr);
                    out.push(')');
                }
                Constraint::ForeignKey(fk) if inline_foreign_key => {
                    out.push(' ');
                    fk.write_references(out);
                }
                Constraint::ForeignKey(_) => {}
            }
        }
    }
}

/// Immutable descriptor of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: &'static str,
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Look up the column declared for `field`.
    pub fn column<R, T>(&self, field: Field<R, T>) -> Option<&ColumnDef> {
        self.column_by_field(field.name())
    }

    pub fn column_by_field(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn column_by_name(&self, column: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Column name for `field`, or a schema error if the field is not declared.
    pub fn column_name<R, T>(&self, field: Field<R, T>) -> OrmResult<&'static str> {
        self.column_def(field).map(|c| c.column)
    }

    /// Constraints for `field`, in canonical order.
    pub fn constraints<R, T>(&self, field: Field<R, T>) -> OrmResult<&[Constraint]> {
        self.column_def(field).map(|c| c.constraints.as_slice())
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.is_primary_key())
    }

    pub fn auto_increment_column(&self) -> Option<&ColumnDef> {
        self.primary_key().filter(|c| c.is_auto_increment())
    }

    /// Table-qualified references for every column, in declaration order.
    pub fn column_refs(&self) -> Vec<ColumnRef> {
        self.columns
            .iter()
            .map(|c| ColumnRef::new(self.table, c.column))
            .collect()
    }

    /// The column declared for `field`, or a schema error.
    pub fn column_def<R, T>(&self, field: Field<R, T>) -> OrmResult<&ColumnDef> {
        self.column(field).ok_or_else(|| {
            OrmError::schema(
                self.table,
                format!("field '{}' is not declared", field.name()),
            )
        })
    }
}

/// Builder for a [`TableSchema`], typed by the record it describes.
pub struct SchemaBuilder<R> {
    table: &'static str,
    columns: Vec<ColumnDef>,
    _record: PhantomData<fn() -> R>,
}

impl<R> SchemaBuilder<R> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Declare a column with an explicit type and constraints.
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

    /// Declare a column whose type and nullability follow the field's Rust type.
    pub fn field<T: ColumnType>(self, field: Field<R, T>) -> Self {
        self.field_with(field, std::iter::empty())
    }

    /// Like [`field`](Self::field), with extra constraints.
    pub fn field_with<T: ColumnType>(
        self,
        field: Field<R, T>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let mut all: Vec<Constraint> = constraints.into_iter().collect();
        if !T::nullable() && !all.contains(&Constraint::NotNull) {
            all.push(Constraint::NotNull);
        }
        self.column(field, T::sql_type(), all)
    }

    /// Validate and freeze the descriptor.
    pub fn build(self) -> OrmResult<TableSchema> {
        let table = self.table;
        let fail = |message: String| OrmError::schema(table, message);

        ident::validate(table).map_err(|e| fail(e.to_string()))?;
        if self.columns.is_empty() {
            return Err(fail("no columns declared".to_string()));
        }

        for (i, col) in self.columns.iter().enumerate() {
            ident::validate(col.column)
                .map_err(|e| fail(format!("field '{}': {e}", col.field)))?;
            let earlier = &self.columns[..i];
            // The engine compares column names case-insensitively.
            if earlier
                .iter()
                .any(|c| c.column.eq_ignore_ascii_case(col.column))
            {
                return Err(fail(format!("duplicate column name '{}'", col.column)));
            }
            if earlier.iter().any(|c| c.field == col.field) {
                return Err(fail(format!("duplicate field '{}'", col.field)));
            }
        }

        if self.columns.iter().filter(|c| c.is_primary_key()).count() > 1 {
            return Err(fail("more than one primary key column".to_string()));
        }

        for col in &self.columns {
            let Some(fk) = col.foreign_key() else {
                continue;
            };
            if fk.table.is_empty() || fk.column.is_empty() {
                return Err(fail(format!(
                    "foreign key on '{}' has an empty target",
                    col.column
                )));
            }
            if fk.table == table && !self.columns.iter().any(|c| c.column == fk.column) {
                return Err(fail(format!(
                    "foreign key on '{}' references unknown column '{}'",
                    col.column, fk.column
                )));
            }
        }

        Ok(TableSchema {
            table,
            columns: self.columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Moon;

    const ID: Field<Moon, Option<i64>> = Field::new("id", "id");
    const NAME: Field<Moon, String> = Field::new("name", "name");
    const ALIAS: Field<Moon, String> = Field::new("alias", "NAME");
    const PARENT: Field<Moon, Option<i64>> = Field::new("parent", "parentID");

    #[test]
    fn field_infers_type_and_not_null() {
        let schema = SchemaBuilder::new("moon")
            .field_with(ID, [Constraint::primary_key()])
            .field(NAME)
            .build()
            .unwrap();

        let id = schema.column(ID).unwrap();
        assert_eq!(id.sql_type, SqlType::Integer);
        assert!(!id.is_not_null());
        assert!(id.is_auto_increment());

        let name = schema.column(NAME).unwrap();
        assert_eq!(name.sql_type, SqlType::Text);
        assert!(name.is_not_null());
        assert_eq!(schema.column_name(NAME).unwrap(), "name");
    }

    #[test]
    fn constraints_are_kept_in_canonical_order() {
        let col = ColumnDef::new(
            "name",
            "name",
            SqlType::Text,
            [
                Constraint::default_literal("Unamed Planet"),
                Constraint::NotNull,
                Constraint::primary_key(),
            ],
        );
        let mut sql = String::new();
        col.write_definition(&mut sql, false);
        assert_eq!(sql, "name TEXT PRIMARY KEY NOT NULL DEFAULT 'Unamed Planet'");
    }

    #[test]
    fn duplicate_column_names_are_rejected_at_build() {
        let err = SchemaBuilder::new("moon")
            .field(NAME)
            .field(ALIAS)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Schema { ref message, .. } if message.contains("duplicate column")));
    }

    #[test]
    fn two_primary_keys_are_rejected() {
        let err = SchemaBuilder::new("moon")
            .field_with(ID, [Constraint::primary_key()])
            .field_with(NAME, [Constraint::primary_key()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than one primary key"));
    }

    #[test]
    fn dangling_self_reference_is_rejected() {
        let bad = ForeignKey {
            table: "moon",
            column: "missing",
            on_delete: None,
            on_update: None,
        };
        let err = SchemaBuilder::new("moon")
            .field_with(ID, [Constraint::primary_key()])
            .column(PARENT, SqlType::Integer, [bad.into()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown column 'missing'"));
    }

    #[test]
    fn undeclared_field_lookup_is_a_schema_error() {
        let schema = SchemaBuilder::new("moon").field(NAME).build().unwrap();
        assert!(matches!(
            schema.constraints(PARENT),
            Err(OrmError::Schema { .. })
        ));
    }

    #[test]
    fn computed_default_is_parenthesized() {
        let col = ColumnDef::new(
            "created",
            "created",
            SqlType::Text,
            [Constraint::default_expr("CURRENT_TIMESTAMP")],
        );
        let mut sql = String::new();
        col.write_definition(&mut sql, false);
        assert_eq!(sql, "created TEXT DEFAULT (CURRENT_TIMESTAMP)");
    }
}
