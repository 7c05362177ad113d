//! Statement logging and per-connection statistics.
//!
//! Every statement a [`Connection`](crate::Connection) runs is reported as a
//! `tracing` event under the `litorm::sql` target:
//!
//! - success at the configured level (DEBUG by default),
//! - success slower than the slow-query threshold at WARN,
//! - failure at WARN with the engine's reason.
//!
//! Install any `tracing` subscriber to see them, e.g.
//! `RUST_LOG=litorm::sql=debug` with `tracing-subscriber`'s env filter.

use std::fmt;
use std::time::Duration;
use tracing::Level;

/// Target of all statement events.
pub const SQL_TARGET: &str = "litorm::sql";

/// Cut `sql` to at most `max_bytes`, on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Kind of statement, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE / ALTER / DROP
    Ddl,
    Other,
}

impl QueryType {
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") || starts_with_keyword(trimmed, "VALUES") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") || starts_with_keyword(trimmed, "REPLACE")
        {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if ["CREATE", "ALTER", "DROP"]
            .iter()
            .any(|kw| starts_with_keyword(trimmed, kw))
        {
            QueryType::Ddl
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::detect_cte_statement(trimmed)
        } else {
            QueryType::Other
        }
    }

    /// The statement following the CTE definitions of a `WITH ...` query.
    fn detect_cte_statement(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut depth: i32 = 0;
        let mut last_top_level = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        last_top_level = i + 1;
                    }
                }
                b'\'' => {
                    i += 1;
                    while i < bytes.len() {
                        if bytes[i] == b'\'' {
                            if bytes.get(i + 1) == Some(&b'\'') {
                                i += 1;
                            } else {
                                break;
                            }
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let rest = sql[last_top_level..].trim_start();
        if starts_with_keyword(rest, "INSERT") || starts_with_keyword(rest, "REPLACE") {
            QueryType::Insert
        } else if starts_with_keyword(rest, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(rest, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Select
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryType::Select => "select",
            QueryType::Insert => "insert",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
            QueryType::Ddl => "ddl",
            QueryType::Other => "other",
        })
    }
}

/// Skip whitespace, comments and opening parentheses before the first keyword.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            match rest.find('\n') {
                Some(pos) => s = &rest[pos + 1..],
                None => return "",
            }
        } else if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => s = &rest[pos + 2..],
                None => return "",
            }
        } else if let Some(rest) = s.strip_prefix('(') {
            s = rest;
        } else {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(keyword) => s[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_')),
        _ => false,
    }
}

/// Statistics collected by one connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Statements executed, including failed ones.
    pub total_queries: u64,
    pub failed_queries: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    /// Truncated SQL of the slowest statement so far.
    pub slowest_query: Option<String>,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub ddl_count: u64,
    pub other_count: u64,
}

impl QueryStats {
    pub(crate) fn record(&mut self, kind: QueryType, sql: &str, elapsed: Duration, ok: bool) {
        self.total_queries += 1;
        if !ok {
            self.failed_queries += 1;
        }
        self.total_duration += elapsed;
        if elapsed >= self.max_duration {
            self.max_duration = elapsed;
            self.slowest_query = Some(truncate_sql_bytes(sql, 200).to_string());
        }
        let counter = match kind {
            QueryType::Select => &mut self.select_count,
            QueryType::Insert => &mut self.insert_count,
            QueryType::Update => &mut self.update_count,
            QueryType::Delete => &mut self.delete_count,
            QueryType::Ddl => &mut self.ddl_count,
            QueryType::Other => &mut self.other_count,
        };
        *counter += 1;
    }

    /// Mean duration over all executed statements.
    pub fn avg_duration(&self) -> Duration {
        if self.total_queries == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_duration.as_nanos() / u128::from(self.total_queries);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Emits one `tracing` event per executed statement.
#[derive(Debug, Clone)]
pub(crate) struct SqlLogger {
    pub(crate) enabled: bool,
    pub(crate) level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub(crate) max_sql_length: Option<usize>,
    pub(crate) slow_query_threshold: Option<Duration>,
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl SqlLogger {
    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold.is_some_and(|t| elapsed > t)
    }

    pub(crate) fn success(
        &self,
        kind: QueryType,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        rows: u64,
    ) {
        if !self.enabled {
            return;
        }
        let sql = self.truncate_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if self.is_slow(elapsed) {
            tracing::warn!(
                target: SQL_TARGET,
                query_type = %kind,
                param_count,
                elapsed_ms,
                rows,
                sql = %sql,
                "slow query"
            );
            return;
        }
        emit_at_level!(
            self.level,
            target: SQL_TARGET,
            query_type = %kind,
            param_count,
            elapsed_ms,
            rows,
            sql = %sql,
        );
    }

    pub(crate) fn failure(
        &self,
        kind: QueryType,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        reason: &str,
    ) {
        if !self.enabled {
            return;
        }
        let sql = self.truncate_sql(sql);
        tracing::warn!(
            target: SQL_TARGET,
            query_type = %kind,
            param_count,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            error = reason,
            sql = %sql,
            "query failed"
        );
    }
}
