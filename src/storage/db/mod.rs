//! Database abstraction layer for multi-backend support.
//!
//! Currently supports SQLite. PostgreSQL is recognised by the engine selector
//! but rejected at build time until a backend exists.
//!
//! # Architecture
//!
//! The abstraction is intentionally minimal:
//! - [`DatabaseEngine`]: closed set of engines a configuration may select
//! - [`SqlitePool`]: connection pool wrapper for SQLite
//! - [`DatabaseHandle`]: the shared pool plus the guard that serializes model
//!   creation, passed by reference to every store
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::connect("sqlite:data/meshreg.db?mode=rwc", &SqliteOptions::default()).await?;
//! let db = DatabaseHandle::new(pool);
//! let row = sqlx::query("SELECT 1").fetch_one(db.pool()).await?;
//! ```

mod sqlite;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::{Mutex, MutexGuard};

pub use sqlite::{SqliteOptions, SqlitePool};

/// Storage engines a configuration may select.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DatabaseEngine {
    /// File-backed (or in-memory) SQLite.
    Sqlite,
    /// PostgreSQL. Recognised but not implemented.
    Postgres,
}

/// Shared connection resource plus its model-creation guard.
///
/// Cloning is not offered; stores hold an `Arc<DatabaseHandle>` so that every
/// store sees the same guard.
pub struct DatabaseHandle {
    pool: SqlitePool,
    model_lock: Mutex<()>,
}

impl std::fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl DatabaseHandle {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            model_lock: Mutex::new(()),
        }
    }

    /// Underlying sqlx pool for query execution.
    ///
    /// Reads and component writes go straight to the pool and take no lock.
    #[inline]
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.pool.inner()
    }

    /// Acquire the process-wide model creation guard.
    ///
    /// Held across the lookup and the insert of a model row, and nothing
    /// else. All model registrations, whatever their content, queue here.
    pub(crate) async fn lock_model_creation(&self) -> MutexGuard<'_, ()> {
        self.model_lock.lock().await
    }

    /// Close the pool once all in-flight writes have completed.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
