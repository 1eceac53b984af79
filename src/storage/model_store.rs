//! Deduplicating store for shared models.
//!
//! A model row is written at most once per distinct content. The check for
//! an existing row and the insert of a new one run under the
//! [`DatabaseHandle`] model guard, so concurrent registrations of the same
//! content never both observe "absent".

use std::sync::Arc;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::storage::StorageError;
use crate::storage::db::DatabaseHandle;
use crate::storage::hash::derive_id;
use crate::storage::types::{Metadata, Model};

/// Outcome of [`ModelRegistry::get_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dedup {
    /// An existing row was reused; nothing was written.
    Hit,
    /// No row existed; one was created.
    Miss,
}

/// Model storage facade.
#[derive(Clone)]
pub struct ModelRegistry {
    db: Arc<DatabaseHandle>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry").finish_non_exhaustive()
    }
}

impl ModelRegistry {
    pub fn new(db: Arc<DatabaseHandle>) -> Self {
        Self { db }
    }

    /// Return the id of the stored model with this content, creating the row
    /// if it does not exist yet.
    ///
    /// Lock scope: the model guard is held from the lookup through the insert
    /// and released before returning. A lookup failure other than "not
    /// found" is returned without writing.
    pub async fn get_or_create(&self, model: &Model) -> Result<(Uuid, Dedup), StorageError> {
        let id = derive_id(model)?;
        let metadata = serde_json::to_vec(&model.metadata)?;

        let _guard = self.db.lock_model_creation().await;

        if self.exists(id).await? {
            tracing::debug!(model_id = %id, name = %model.name, "Model dedup hit");
            return Ok((id, Dedup::Hit));
        }

        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO models (id, name, version, display_name, category, sub_category, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&model.name)
        .bind(&model.version)
        .bind(&model.display_name)
        .bind(&model.category)
        .bind(&model.sub_category)
        .bind(metadata)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        tracing::info!(
            model_id = %id,
            name = %model.name,
            version = %model.version,
            "Model created"
        );
        Ok((id, Dedup::Miss))
    }

    /// Get a model by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Model>, StorageError> {
        let result = sqlx::query(
            "SELECT id, name, version, display_name, category, sub_category, metadata
             FROM models WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_one(self.db.pool())
        .await;

        match result {
            Ok(row) => Ok(Some(model_from_row(&row, "")?)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Number of stored models.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM models")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("SELECT id FROM models WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(self.db.pool())
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::RowNotFound) => Ok(false),
            Err(e) => Err(StorageError::from(e)),
        }
    }
}

/// Rebuild a model from a row whose model columns carry `prefix`
/// (`""` for the models table, `"model_"` for the component join).
pub(crate) fn model_from_row(row: &SqliteRow, prefix: &str) -> Result<Model, StorageError> {
    let col = |name: &str| format!("{prefix}{name}");

    let id_str: String = row.try_get(col("id").as_str())?;
    let id = parse_uuid(&id_str)?;
    let metadata_bytes: Vec<u8> = row.try_get(col("metadata").as_str())?;
    let metadata: Metadata =
        serde_json::from_slice(&metadata_bytes).map_err(|source| StorageError::Unmarshal {
            record: format!("model {id}"),
            field: "metadata",
            source,
        })?;

    Ok(Model {
        id: Some(id),
        name: row.try_get(col("name").as_str())?,
        version: row.try_get(col("version").as_str())?,
        display_name: row.try_get(col("display_name").as_str())?,
        category: row.try_get(col("category").as_str())?,
        sub_category: row.try_get(col("sub_category").as_str())?,
        metadata,
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(s).map_err(|e| StorageError::InvalidData(format!("invalid id '{s}': {e}")))
}
