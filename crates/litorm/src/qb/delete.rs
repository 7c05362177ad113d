//! DELETE builder.

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::ident;
use crate::qb::expr::{Expr, ExprGroup};
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::record::Record;
use std::marker::PhantomData;

/// DELETE from the table of record `R`.
///
/// **Hazard:** without a [`filter`](Self::filter) every row is deleted. This is
/// allowed; running it logs a WARN.
#[derive(Debug)]
pub struct DeleteQb<R> {
    where_group: ExprGroup,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> DeleteQb<R> {
    pub fn new() -> Self {
        Self {
            where_group: ExprGroup::new(),
            _record: PhantomData,
        }
    }

    /// Add a WHERE predicate. Repeated calls are ANDed.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }
}

impl<R: Record> Default for DeleteQb<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> SqlQb for DeleteQb<R> {
    fn build(&self) -> OrmResult<BuiltQuery> {
        ident::validate(R::TABLE)?;
        if let Some(err) = self.where_group.encode_error() {
            return Err(err);
        }
        let mut params = ParamList::new();
        let mut sql = String::from("DELETE FROM ");
        ident::write_ident(&mut sql, R::TABLE);

        self.where_group.write_where(&mut sql, &mut params);

        Ok(BuiltQuery::new(sql, params.into_vec()))
    }
}

impl<R: Record> MutationQb for DeleteQb<R> {
    fn run(self, conn: &impl GenericClient) -> OrmResult<u64> {
        let query = self.build()?;
        if self.where_group.is_empty() {
            tracing::warn!(
                target: "litorm::qb",
                table = R::TABLE,
                "DELETE without a filter affects every row"
            );
        }
        conn.run_built(&query)
    }
}
