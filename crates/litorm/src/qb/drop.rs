//! DROP TABLE builder.

use crate::error::OrmResult;
use crate::ident;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::Record;
use std::marker::PhantomData;

/// DROP TABLE for the table of record `R`.
///
/// Without [`if_exists`](Self::if_exists), dropping a missing table fails with
/// the engine's own error.
#[derive(Debug)]
pub struct DropTableQb<R> {
    if_exists: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> DropTableQb<R> {
    pub fn new() -> Self {
        Self {
            if_exists: false,
            _record: PhantomData,
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

impl<R: Record> Default for DropTableQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for DropTableQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        ident::validate(R::TABLE)?;
        let mut sql = String::from("DROP TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        ident::write_ident(&mut sql, R::TABLE);
        Ok(BuiltQuery::new(sql, Vec::new()))
    }
}

impl<R: Record> MutationQb for DropTableQb<R> {}
