//! # litorm
//!
//! A typed query builder and row decoder for embedded SQLite.
//!
//! ## Features
//!
//! - **Typed field references**: `Planet::NAME` is a `Field<Planet, String>` const, so
//!   predicates and assignments are checked at compile time
//! - **Explicit schemas**: each record type declares its table through [`Record`]
//!   (by hand or with `#[derive(Record)]`); descriptors are built once and cached
//! - **Safe binding**: every value is a numbered `?N` parameter, never inlined
//! - **Join-aware decoding**: result columns keep their `(table, column)` origin, so
//!   same-named columns from joined tables decode into the right record
//! - **Transaction-friendly**: pass a [`Transaction`] anywhere a [`GenericClient`] is expected
//! - **Query monitoring**: every statement is timed, logged through `tracing` and counted
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use litorm::prelude::*;
//! use litorm::qb::{self, or};
//!
//! #[derive(Debug, FromRow, Record)]
//! #[orm(table = "Galaxy")]
//! struct Galaxy {
//!     #[orm(id)]
//!     id: Option<i64>,
//!     name: String,
//! }
//!
//! let conn = Connection::open_in_memory()?;
//! qb::create::<Galaxy>().all_fields().run(&conn)?;
//! qb::insert::<Galaxy>()
//!     .value(&Galaxy { id: None, name: "Milky Way".into() })
//!     .run(&conn)?;
//!
//! let found = qb::select()
//!     .all()
//!     .from::<Galaxy>()
//!     .filter(or([Galaxy::NAME.eq("Milky Way"), Galaxy::NAME.eq("Andromeda")]))
//!     .run_decoding::<Galaxy>(&conn)?;
//! ```

extern crate self as litorm;

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod row;
pub mod schema;
pub mod transaction;
pub mod value;

pub use client::GenericClient;
pub use config::{ConnectionConfig, Storage};
pub use connection::{Connection, Database};
pub use error::{OrmError, OrmResult};
pub use monitor::{QueryStats, QueryType, SQL_TARGET};
pub use record::{schema_of, Encoder, Field, Record};
pub use row::{ColumnRef, FromRow, Row, RowDecoder};
pub use schema::{
    ColumnDef, Constraint, DefaultValue, ForeignKey, ForeignKeyAction, SchemaBuilder, SqlType,
    TableSchema,
};
pub use transaction::Transaction;
pub use value::{ColumnType, FromValue, Json, ToValue, Value, ValueError, ValueKind};

// Re-export qb entry points for easy access
pub use qb::{
    not, or, BuiltQuery, ConflictResolution, Expr, MutationQb, Order, SelectQb, SqlQb,
};

#[cfg(feature = "derive")]
pub use litorm_derive::{FromRow, Record};
