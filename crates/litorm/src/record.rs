//! Record types: typed field tokens, descriptor registration and row encoding.
//!
//! A record type binds itself to a table by implementing [`Record`]. The impl is
//! usually generated by `#[derive(Record)]`, but it is ordinary code and can be
//! written by hand:
//!
//! ```ignore
//! use litorm::prelude::*;
//!
//! struct Galaxy {
//!     id: Option<i64>,
//!     name: String,
//! }
//!
//! impl Galaxy {
//!     pub const ID: Field<Galaxy, Option<i64>> = Field::new("id", "id");
//!     pub const NAME: Field<Galaxy, String> = Field::new("name", "name");
//! }
//!
//! impl Record for Galaxy {
//!     const TABLE: &'static str = "Galaxy";
//!
//!     fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
//!         schema
//!             .field_with(Self::ID, [Constraint::primary_key()])
//!             .field(Self::NAME)
//!     }
//!
//!     fn encode(&self, out: &mut Encoder<Self>) {
//!         out.set(Self::ID, &self.id);
//!         out.set(Self::NAME, &self.name);
//!     }
//! }
//! ```

use crate::error::{OrmError, OrmResult};
use crate::row::{ColumnRef, FromRow};
use crate::schema::{SchemaBuilder, TableSchema};
use crate::value::{ToValue, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{OnceLock, PoisonError, RwLock};

/// A typed reference to one field of record `R`, whose values are of type `T`.
pub struct Field<R, T> {
    name: &'static str,
    column: &'static str,
    _marker: PhantomData<fn() -> (R, T)>,
}

impl<R, T> Field<R, T> {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            _marker: PhantomData,
        }
    }

    /// Field identifier in the record type.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Column name in the table.
    pub const fn column_name(&self) -> &'static str {
        self.column
    }
}

impl<R: Record, T> Field<R, T> {
    pub fn table_name(&self) -> &'static str {
        R::TABLE
    }

    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(R::TABLE, self.column)
    }
}

impl<R, T> Clone for Field<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Field<R, T> {}

impl<R, T> fmt::Debug for Field<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column)
            .finish()
    }
}

/// A type persisted as rows of one table.
pub trait Record: FromRow + Sized + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Declare the table's columns, in order.
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;

    /// Write every field's value into `out`.
    fn encode(&self, out: &mut Encoder<Self>);

    /// The cached descriptor for this type.
    fn schema() -> OrmResult<&'static TableSchema> {
        schema_of::<Self>()
    }
}

/// Collects the encoded field values of one record.
///
/// A value that fails to encode is not stored; the first such failure is kept
/// and reported by the statement the encoder feeds.
pub struct Encoder<R> {
    values: Vec<(&'static str, Value)>,
    error: Option<OrmError>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Encoder<R> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            error: None,
            _record: PhantomData,
        }
    }

    /// Record the value of `field`. A later call for the same field replaces the earlier one.
    pub fn set<T: ToValue>(&mut self, field: Field<R, T>, value: &T) {
        let value = match value.to_value() {
            Ok(value) => value,
            Err(e) => {
                self.error.get_or_insert(OrmError::builder(format!(
                    "cannot encode field '{}': {e}",
                    field.name()
                )));
                return;
            }
        };
        match self.values.iter_mut().find(|(name, _)| *name == field.name()) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field.name(), value)),
        }
    }

    /// First encoding failure, if any.
    pub fn error(&self) -> Option<&OrmError> {
        self.error.as_ref()
    }

    /// Value recorded for the field named `field`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| v)
    }

    /// Encoded `(field, value)` pairs in the order they were set.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(name, v)| (*name, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<R> Default for Encoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Encoder<R> {
    /// Encode `record` into a fresh encoder.
    pub fn encode(record: &R) -> Self {
        let mut out = Self::new();
        record.encode(&mut out);
        out
    }
}

type Registry = RwLock<HashMap<TypeId, &'static TableSchema>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Get the descriptor of `R`, building and caching it on first use.
///
/// A descriptor that fails validation is not cached; every lookup reports the error again.
pub fn schema_of<R: Record>() -> OrmResult<&'static TableSchema> {
    let id = TypeId::of::<R>();
    if let Some(schema) = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
    {
        return Ok(schema);
    }

    let built = R::describe(SchemaBuilder::new(R::TABLE)).build()?;
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    Ok(*map
        .entry(id)
        .or_insert_with(|| Box::leak(Box::new(built))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;
    use crate::row::RowDecoder;
    use crate::schema::Constraint;

    struct Star {
        id: Option<i64>,
        name: String,
    }

    impl Star {
        const ID: Field<Star, Option<i64>> = Field::new("id", "id");
        const NAME: Field<Star, String> = Field::new("name", "starName");
    }

    impl FromRow for Star {
        fn from_row(row: &RowDecoder<'_>) -> OrmResult<Self> {
            Ok(Self {
                id: row.field(Self::ID)?,
                name: row.field(Self::NAME)?,
            })
        }
    }

    impl Record for Star {
        const TABLE: &'static str = "Star";

        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema
                .field_with(Self::ID, [Constraint::primary_key()])
                .field(Self::NAME)
        }

        fn encode(&self, out: &mut Encoder<Self>) {
            out.set(Self::ID, &self.id);
            out.set(Self::NAME, &self.name);
        }
    }

    struct Broken;

    impl Broken {
        const A: Field<Broken, i64> = Field::new("a", "x");
        const B: Field<Broken, i64> = Field::new("b", "x");
    }

    impl FromRow for Broken {
        fn from_row(_: &RowDecoder<'_>) -> OrmResult<Self> {
            Ok(Broken)
        }
    }

    impl Record for Broken {
        const TABLE: &'static str = "Broken";

        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema.field(Self::A).field(Self::B)
        }

        fn encode(&self, _: &mut Encoder<Self>) {}
    }

    #[test]
    fn schema_is_built_once_and_shared() {
        let a = Star::schema().unwrap();
        let b = schema_of::<Star>().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.table_name(), "Star");
        assert_eq!(a.column_name(Star::NAME).unwrap(), "starName");
    }

    #[test]
    fn invalid_descriptor_is_reported_on_every_lookup() {
        for _ in 0..2 {
            let err = schema_of::<Broken>().unwrap_err();
            assert!(matches!(err, OrmError::Schema { ref table, .. } if table == "Broken"));
        }
    }

    #[test]
    fn encoder_keeps_field_order_and_replaces_duplicates() {
        let star = Star {
            id: None,
            name: "Sol".into(),
        };
        let mut out = Encoder::encode(&star);
        out.set(Star::NAME, &"Sun".to_string());
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("id"), Some(&Value::Null));
        assert_eq!(out.get("name"), Some(&Value::Text("Sun".into())));
    }

    #[test]
    fn encoding_failures_are_kept_for_the_statement() {
        use crate::value::Json;
        use std::collections::HashMap;

        const SHAPE: Field<Star, Json<HashMap<(i32, i32), i32>>> = Field::new("shape", "shape");

        let mut out = Encoder::<Star>::new();
        out.set(Star::NAME, &"Sol".to_string());
        out.set(SHAPE, &Json(HashMap::from([((1, 2), 3)])));
        assert_eq!(out.len(), 1);
        let err = out.error().unwrap();
        assert!(matches!(err, OrmError::Builder(msg) if msg.contains("'shape'")));
    }

    #[test]
    fn field_reports_table_and_column() {
        assert_eq!(Star::NAME.table_name(), "Star");
        assert_eq!(Star::NAME.column_ref(), ColumnRef::new("Star", "starName"));
        assert_eq!(Star::NAME.name(), "name");
    }
}
