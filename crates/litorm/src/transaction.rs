//! Transactions.
//!
//! A [`Transaction`] implements [`GenericClient`], so every builder and
//! repository function that takes `&impl GenericClient` runs inside it unchanged.
//!
//! ```ignore
//! conn.with_transaction(|tx| {
//!     qb::insert::<Galaxy>().value(&andromeda).run(tx)?;
//!     qb::insert::<Planet>().values(&planets).run(tx)?;
//!     Ok(())
//! })?;
//! ```

use crate::client::GenericClient;
use crate::connection::Connection;
use crate::error::OrmResult;
use crate::row::{ColumnRef, Row};
use crate::value::Value;

/// An open `BEGIN ... COMMIT` block on a [`Connection`].
///
/// Dropping it without [`commit`](Self::commit) rolls back.
#[derive(Debug)]
#[must_use = "a transaction rolls back when dropped"]
pub struct Transaction<'c> {
    conn: &'c Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn begin(conn: &'c Connection) -> OrmResult<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Commit. If COMMIT fails the transaction is rolled back on drop.
    pub fn commit(mut self) -> OrmResult<()> {
        let result = self.conn.execute_batch("COMMIT");
        self.finished = result.is_ok();
        result
    }

    pub fn rollback(mut self) -> OrmResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")
    }

    /// The connection this transaction runs on.
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(
                target: "litorm::connection",
                error = %err,
                "rollback of dropped transaction failed"
            );
        }
    }
}

impl GenericClient for Transaction<'_> {
    fn query_raw(
        &self,
        sql: &str,
        params: &[Value],
        columns: Option<&[ColumnRef]>,
    ) -> OrmResult<Vec<Row>> {
        self.conn.query_raw(sql, params, columns)
    }

    fn execute_raw(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.conn.execute_raw(sql, params)
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.conn.last_insert_id()
    }
}
