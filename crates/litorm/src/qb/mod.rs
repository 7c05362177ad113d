//! Typed statement builders.
//!
//! Every builder is parameterized by the record type whose table it targets,
//! renders numbered `?N` placeholders and performs no I/O until a terminal `run*`
//! call. Terminal calls take the builder by value, so a builder cannot be run twice.
//!
//! # Usage
//!
//! ```ignore
//! use litorm::qb::{self, or, MutationQb};
//!
//! qb::create::<Galaxy>().all_fields().run(&conn)?;
//! qb::create::<Planet>().all_fields().run(&conn)?;
//!
//! qb::insert::<Galaxy>().value(&milky_way).run(&conn)?;
//! let galaxy_id = conn.last_insert_id();
//!
//! qb::update::<Planet>()
//!     .filter(Planet::NAME.eq("Jupiterr"))
//!     .set("name", "Jupiter")
//!     .run(&conn)?;
//!
//! let inner = qb::select()
//!     .all()
//!     .from::<Planet>()
//!     .filter(or([
//!         Planet::NAME.eq("Mercury"),
//!         Planet::NAME.eq("Venus"),
//!         Planet::NAME.eq("Earth"),
//!     ]))
//!     .run_decoding::<Planet>(&conn)?;
//!
//! let pairs = qb::select()
//!     .all()
//!     .from::<Planet>()
//!     .join::<Galaxy>(Planet::GALAXY_ID.eq_field(Galaxy::ID))
//!     .run_with(&conn, |row| Ok((row.decode::<Planet>()?, row.decode::<Galaxy>()?)))?;
//!
//! qb::delete::<Planet>().filter(Planet::NAME.eq("Pluto")).run(&conn)?;
//! ```

mod alter;
mod create;
mod delete;
mod drop;
mod expr;
mod insert;
mod param;
mod select;
mod traits;
mod update;

pub use alter::AlterTableQb;
pub use create::CreateTableQb;
pub use delete::DeleteQb;
pub use drop::DropTableQb;
pub use expr::{not, or, Expr, ExprGroup, Op, Operand};
pub use insert::{ConflictResolution, InsertQb};
pub use param::ParamList;
pub use select::{JoinKind, Order, SelectQb, SelectStart};
pub use traits::{BuiltQuery, MutationQb, SqlQb};
pub use update::UpdateQb;

use crate::record::Record;

/// CREATE TABLE for `R`.
pub fn create<R: Record>() -> CreateTableQb<R> {
    CreateTableQb::new()
}

/// ALTER TABLE for `R`.
pub fn alter<R: Record>() -> AlterTableQb<R> {
    AlterTableQb::new()
}

/// DROP TABLE for `R`.
pub fn drop<R: Record>() -> DropTableQb<R> {
    DropTableQb::new()
}

/// INSERT INTO the table of `R`.
pub fn insert<R: Record>() -> InsertQb<R> {
    InsertQb::new()
}

/// UPDATE the table of `R`.
///
/// # Hazard
/// Without `.filter(..)` every row is updated.
pub fn update<R: Record>() -> UpdateQb<R> {
    UpdateQb::new()
}

/// DELETE FROM the table of `R`.
///
/// # Hazard
/// Without `.filter(..)` every row is deleted.
pub fn delete<R: Record>() -> DeleteQb<R> {
    DeleteQb::new()
}

/// SELECT: continue with `.all().from::<R>()`.
pub fn select() -> SelectStart {
    SelectStart
}
