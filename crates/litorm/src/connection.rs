//! SQLite connection facade.
//!
//! [`Connection`] owns one engine handle and is the only place statements reach
//! the engine. Every statement is timed, reported through [`SqlLogger`] and
//! counted in the connection's [`QueryStats`].
//!
//! A connection is `Send` but not `Sync`: open one per worker thread, e.g. via a
//! shared [`Database`].
//!
//! Rows of hand-written SQL are addressed by the table each result column was
//! read from, as reported by the engine. Expression columns stay unqualified.

use crate::client::GenericClient;
use crate::config::{ConnectionConfig, Storage};
use crate::error::{OrmError, OrmResult};
use crate::monitor::{QueryStats, QueryType, SqlLogger};
use crate::row::{ColumnRef, Row};
use crate::transaction::Transaction;
use crate::value::Value;
use rusqlite::params_from_iter;
use std::cell::RefCell;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// A single connection to an SQLite database.
#[derive(Debug)]
pub struct Connection {
    inner: rusqlite::Connection,
    logger: SqlLogger,
    stats: Option<RefCell<QueryStats>>,
}

impl Connection {
    /// Open (or create) the database file at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Self::with_config(&ConnectionConfig::file(path.as_ref()))
    }

    /// Open a private in-memory database with default settings.
    pub fn open_in_memory() -> OrmResult<Self> {
        Self::with_config(&ConnectionConfig::memory())
    }

    /// Open with `config`. [`Storage::Memory`] gives a private database.
    pub fn with_config(config: &ConnectionConfig) -> OrmResult<Self> {
        let inner = match &config.storage {
            Storage::Memory => rusqlite::Connection::open_in_memory(),
            Storage::File(path) => rusqlite::Connection::open(path),
        }
        .map_err(|e| OrmError::Connection(format!("{:?}: {e}", config.storage)))?;
        Self::configure(inner, config)
    }

    fn configure(inner: rusqlite::Connection, config: &ConnectionConfig) -> OrmResult<Self> {
        if let Some(timeout) = config.busy_timeout {
            inner
                .busy_timeout(timeout)
                .map_err(|e| OrmError::Connection(format!("busy_timeout: {e}")))?;
        }
        inner
            .pragma_update(None, "foreign_keys", config.foreign_keys)
            .map_err(|e| OrmError::Connection(format!("foreign_keys: {e}")))?;

        tracing::debug!(
            target: "litorm::connection",
            storage = ?config.storage,
            foreign_keys = config.foreign_keys,
            "connection opened"
        );

        Ok(Self {
            inner,
            logger: config.logger(),
            stats: config
                .stats_enabled
                .then(|| RefCell::new(QueryStats::default())),
        })
    }

    /// Statistics collected so far. Empty when statistics are disabled.
    pub fn stats(&self) -> QueryStats {
        self.stats
            .as_ref()
            .map(|s| s.borrow().clone())
            .unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        if let Some(stats) = &self.stats {
            *stats.borrow_mut() = QueryStats::default();
        }
    }

    /// Run one or more `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.instrument(
            sql,
            0,
            |conn| conn.execute_batch(sql).map_err(OrmError::from),
            |_| 0,
        )
    }

    /// Begin a transaction. It rolls back on drop unless committed.
    pub fn transaction(&self) -> OrmResult<Transaction<'_>> {
        Transaction::begin(self)
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    pub fn with_transaction<T, F>(&self, f: F) -> OrmResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> OrmResult<T>,
    {
        let tx = self.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(error) => {
                tx.rollback()?;
                Err(error)
            }
        }
    }

    /// Whether the engine is outside any explicit transaction.
    pub fn is_autocommit(&self) -> bool {
        self.inner.is_autocommit()
    }

    fn instrument<T>(
        &self,
        sql: &str,
        param_count: usize,
        op: impl FnOnce(&rusqlite::Connection) -> OrmResult<T>,
        rows_of: impl FnOnce(&T) -> u64,
    ) -> OrmResult<T> {
        let kind = QueryType::from_sql(sql);
        let start = Instant::now();
        let result = op(&self.inner);
        let elapsed = start.elapsed();

        match &result {
            Ok(value) => self
                .logger
                .success(kind, sql, param_count, elapsed, rows_of(value)),
            Err(err) => {
                let reason = err.to_string();
                self.logger.failure(
                    kind,
                    sql,
                    param_count,
                    elapsed,
                    err.engine_reason().unwrap_or(&reason),
                );
            }
        }
        if let Some(stats) = &self.stats {
            stats.borrow_mut().record(kind, sql, elapsed, result.is_ok());
        }
        result
    }
}

fn read_rows(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[Value],
    columns: Option<&[ColumnRef]>,
) -> OrmResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let header: Arc<[ColumnRef]> = match columns {
        Some(columns) if columns.len() != width => {
            return Err(OrmError::builder(format!(
                "statement returns {width} columns but {} column origins were given",
                columns.len()
            )));
        }
        Some(columns) => Arc::from(columns),
        None => stmt
            .columns_with_metadata()
            .iter()
            .map(|column| match column.table_name() {
                Some(table) => ColumnRef::new(table.to_string(), column.name().to_string()),
                None => ColumnRef::unqualified(column.name().to_string()),
            })
            .collect::<Vec<_>>()
            .into(),
    };

    let mut cursor = stmt.query(params_from_iter(params.iter()))?;
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for (i, column) in header.iter().enumerate() {
            let value = Value::try_from(row.get_ref(i)?).map_err(|e| e.at(column.to_string()))?;
            values.push(value);
        }
        rows.push(Row::new(Arc::clone(&header), values));
    }
    Ok(rows)
}

fn write_rows(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> OrmResult<u64> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() > 0 {
        // Row-returning statement run for its side effects (e.g. a PRAGMA).
        let mut cursor = stmt.query(params_from_iter(params.iter()))?;
        while cursor.next()?.is_some() {}
        return Ok(0);
    }
    let changed = stmt.execute(params_from_iter(params.iter()))?;
    Ok(changed as u64)
}

impl GenericClient for Connection {
    fn query_raw(
        &self,
        sql: &str,
        params: &[Value],
        columns: Option<&[ColumnRef]>,
    ) -> OrmResult<Vec<Row>> {
        self.instrument(
            sql,
            params.len(),
            |conn| read_rows(conn, sql, params, columns),
            |rows| rows.len() as u64,
        )
    }

    fn execute_raw(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.instrument(
            sql,
            params.len(),
            |conn| write_rows(conn, sql, params),
            |changed| *changed,
        )
    }

    fn last_insert_id(&self) -> Option<i64> {
        match self.inner.last_insert_rowid() {
            0 => None,
            id => Some(id),
        }
    }
}

/// Opens independent connections to the same storage.
///
/// `Database` is `Send + Sync` and cheap to clone; share it between worker
/// threads and call [`connect`](Self::connect) in each. With
/// [`Storage::Memory`] all connections of one `Database` (and its clones) share
/// a single in-memory database, which lives as long as the `Database` does.
#[derive(Debug, Clone)]
pub struct Database {
    config: Arc<ConnectionConfig>,
    memory: Option<Arc<SharedMemory>>,
}

/// A named shared-cache in-memory database, kept alive by an idle connection.
#[derive(Debug)]
struct SharedMemory {
    uri: String,
    anchor: Mutex<Option<rusqlite::Connection>>,
}

impl SharedMemory {
    fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self {
            uri: format!("file:litorm-memdb-{n}?mode=memory&cache=shared"),
            anchor: Mutex::new(None),
        }
    }

    fn open(&self) -> OrmResult<rusqlite::Connection> {
        let open = || {
            rusqlite::Connection::open(&self.uri)
                .map_err(|e| OrmError::Connection(format!("{}: {e}", self.uri)))
        };
        let mut anchor = self.anchor.lock().unwrap_or_else(PoisonError::into_inner);
        if anchor.is_none() {
            *anchor = Some(open()?);
        }
        open()
    }
}

impl Database {
    pub fn new(config: ConnectionConfig) -> Self {
        let memory = matches!(config.storage, Storage::Memory).then(|| Arc::new(SharedMemory::new()));
        Self {
            config: Arc::new(config),
            memory,
        }
    }

    /// File-backed database with default settings.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(ConnectionConfig::file(path.as_ref()))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a new connection.
    pub fn connect(&self) -> OrmResult<Connection> {
        match &self.memory {
            Some(memory) => Connection::configure(memory.open()?, &self.config),
            None => Connection::with_config(&self.config),
        }
    }
}
