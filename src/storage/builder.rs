//! Registry builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing all storage facades.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::storage::StorageError;
use crate::storage::component_store::ComponentStore;
use crate::storage::db::{DatabaseEngine, DatabaseHandle, SqliteOptions, SqlitePool};
use crate::storage::model_store::ModelRegistry;
use crate::storage::schema::init_schema;

/// In-memory SQLite path accepted by [`RegistryBuilder::new`].
pub const IN_MEMORY: &str = ":memory:";

/// Builder for constructing the registry storage layer.
pub struct RegistryBuilder {
    engine: Option<DatabaseEngine>,
    path: PathBuf,
    options: SqliteOptions,
}

impl RegistryBuilder {
    /// Create a new builder for a database at `path`.
    ///
    /// Pass [`IN_MEMORY`] for a throwaway database. An engine must be
    /// selected with [`RegistryBuilder::engine`] before building.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            engine: None,
            path: path.as_ref().to_path_buf(),
            options: SqliteOptions::default(),
        }
    }

    /// Select the storage engine.
    pub fn engine(mut self, engine: DatabaseEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the maximum number of pooled connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.options.max_connections = max;
        self
    }

    /// Set how long to wait for a free pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.options.acquire_timeout = timeout;
        self
    }

    /// Forward executed statements to the tracing subscriber.
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.options.log_statements = enabled;
        self
    }

    /// Connection URL for the configured path.
    fn connection_url(&self) -> String {
        if self.path.as_os_str() == IN_MEMORY {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}", self.path.display())
        }
    }

    /// Open the database, create the schema and return handles.
    ///
    /// # Errors
    /// Returns `StorageError::EngineNotSelected` when no engine was chosen
    /// and `StorageError::UnsupportedEngine` for engines without a backend,
    /// both before anything is opened.
    pub async fn build(self) -> Result<RegistryHandles, StorageError> {
        let engine = match self.engine {
            Some(DatabaseEngine::Sqlite) => DatabaseEngine::Sqlite,
            Some(other) => return Err(StorageError::UnsupportedEngine(other)),
            None => return Err(StorageError::EngineNotSelected),
        };

        // Create parent directory if it doesn't exist
        if self.path.as_os_str() != IN_MEMORY
            && let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Internal(format!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let url = self.connection_url();
        let pool = SqlitePool::connect(&url, &self.options).await?;
        init_schema(pool.inner()).await?;

        let db = Arc::new(DatabaseHandle::new(pool));
        let models = ModelRegistry::new(Arc::clone(&db));
        let components = ComponentStore::new(Arc::clone(&db), models.clone());

        tracing::info!(engine = %engine, path = %self.path.display(), "Registry storage ready");

        Ok(RegistryHandles {
            db,
            models,
            components,
        })
    }
}

/// Handles to all registry facades.
#[derive(Debug, Clone)]
pub struct RegistryHandles {
    db: Arc<DatabaseHandle>,
    /// Shared model records.
    pub models: ModelRegistry,
    /// Component registration and queries.
    pub components: ComponentStore,
}

impl RegistryHandles {
    /// Close the database. Completes outstanding writes first.
    pub async fn shutdown(self) -> Result<(), StorageError> {
        self.db.close().await;
        tracing::info!("Registry storage closed");
        Ok(())
    }
}
