//! Convenient imports for typical `litorm` usage.
//!
//! ```ignore
//! use litorm::prelude::*;
//! ```
//!
//! `FromRow` and `Record` bring both the traits and, with the `derive` feature,
//! the derive macros of the same name.

pub use crate::qb::{self, not, or, MutationQb, Order, SqlQb};
pub use crate::{
    Connection, ConnectionConfig, Constraint, Field, FromRow, GenericClient, OrmError, OrmResult,
    Record, Row, SchemaBuilder, Value,
};
