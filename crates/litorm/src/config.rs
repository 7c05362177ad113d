//! Connection configuration: storage location, engine pragmas, statement
//! logging and statistics.
//!
//! ```ignore
//! let config = ConnectionConfig::file("planets.db")
//!     .with_busy_timeout(Duration::from_secs(2))
//!     .with_slow_query_threshold(Duration::from_millis(50))
//!     .log_level(Level::INFO);
//! let conn = Connection::with_config(&config)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::monitor::SqlLogger;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Storage {
    /// In-memory database. Private to a [`Connection`](crate::Connection) opened
    /// directly; shared by every connection of one [`Database`](crate::Database).
    #[default]
    Memory,
    /// Database file, created if missing.
    File(PathBuf),
}

/// Configuration for opening a [`Connection`](crate::Connection).
///
/// By default: in-memory storage, foreign keys enforced, statement logging at
/// DEBUG with SQL truncated to 200 bytes, statistics collected.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub storage: Storage,
    /// How long the engine waits on a locked database before failing with busy.
    pub busy_timeout: Option<Duration>,
    /// Issue `PRAGMA foreign_keys = ON` after opening.
    pub foreign_keys: bool,
    /// Emit one `tracing` event per statement.
    pub logging: bool,
    /// Level of successful statement events.
    pub log_level: Level,
    /// Truncate long SQL strings in events (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are logged at WARN.
    pub slow_query_threshold: Option<Duration>,
    /// Collect [`QueryStats`](crate::QueryStats).
    pub stats_enabled: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            storage: Storage::Memory,
            busy_timeout: None,
            foreign_keys: true,
            logging: true,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_query_threshold: None,
            stats_enabled: true,
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory storage.
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed storage at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Enable statement logging.
    pub fn enable_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Disable statement logging. Slow and failed statements are silent too.
    pub fn disable_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Set the level of successful statement events.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Truncate SQL in events to `max` bytes.
    pub fn max_sql_length(mut self, max: usize) -> Self {
        self.max_sql_length = Some(max);
        self
    }

    /// Log full SQL text.
    pub fn no_sql_truncation(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    pub(crate) fn logger(&self) -> SqlLogger {
        SqlLogger {
            enabled: self.logging,
            level: self.log_level,
            max_sql_length: self.max_sql_length,
            slow_query_threshold: self.slow_query_threshold,
        }
    }
}
