//! Component storage.
//!
//! Registers component definitions against their (possibly shared) model and
//! rebuilds them from joined rows on the way back out.

use std::str::FromStr;
use std::sync::Arc;

use chrono::DateTime;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::storage::StorageError;
use crate::storage::db::DatabaseHandle;
use crate::storage::filter::{ComponentFilter, COMPONENT_SELECT};
use crate::storage::model_store::{ModelRegistry, model_from_row, parse_uuid};
use crate::storage::types::{ComponentDefinition, ComponentFormat, Metadata, Model, TypeMeta};

/// Component storage facade.
#[derive(Clone)]
pub struct ComponentStore {
    db: Arc<DatabaseHandle>,
    models: ModelRegistry,
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore").finish_non_exhaustive()
    }
}

impl ComponentStore {
    pub fn new(db: Arc<DatabaseHandle>, models: ModelRegistry) -> Self {
        Self { db, models }
    }

    /// Register a component and return its freshly assigned id.
    ///
    /// The embedded model is resolved through [`ModelRegistry::get_or_create`]
    /// first, so the referenced row exists before the component row is
    /// written. Metadata is encoded before anything touches the database.
    /// The component insert itself takes no lock.
    pub async fn register(&self, component: &ComponentDefinition) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        let metadata = serde_json::to_vec(&component.metadata)?;

        let (model_id, dedup) = self.models.get_or_create(&component.model).await?;

        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO components (id, model_id, kind, api_version, display_name, format, metadata, schema, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(model_id.to_string())
        .bind(component.kind())
        .bind(component.api_version())
        .bind(&component.display_name)
        .bind(component.format.to_string())
        .bind(metadata)
        .bind(&component.schema)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(
            component_id = %id,
            model_id = %model_id,
            kind = %component.kind(),
            dedup = ?dedup,
            "Component registered"
        );
        Ok(id)
    }

    /// Get a component, with its model, by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<ComponentDefinition>, StorageError> {
        let sql = format!("{COMPONENT_SELECT} WHERE c.id = ?");
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_one(self.db.pool())
            .await;

        match result {
            Ok(row) => Ok(Some(component_from_row(&row)?)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Query components matching `filter`, joined to their models.
    ///
    /// Failures are logged and returned; `Ok` with an empty vector always
    /// means nothing matched.
    pub async fn query(
        &self,
        filter: &ComponentFilter,
    ) -> Result<Vec<ComponentDefinition>, StorageError> {
        let mut builder = filter.to_query();
        let rows = builder
            .build()
            .fetch_all(self.db.pool())
            .await
            .inspect_err(|e| tracing::error!(error = %e, ?filter, "Component query failed"))?;

        rows.iter()
            .map(component_from_row)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::error!(error = %e, "Failed to decode component row"))
    }

    /// Number of stored components.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM components")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Model registry shared with this store.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }
}

/// Rebuild a component from a row produced by [`COMPONENT_SELECT`].
pub(crate) fn component_from_row(row: &SqliteRow) -> Result<ComponentDefinition, StorageError> {
    let model = model_from_row(row, "model_")?;
    row_to_component(row, model)
}

/// Rebuild a component from its own columns and an already resolved model.
///
/// A metadata payload that does not decode is an error, never an empty map.
pub(crate) fn row_to_component(
    row: &SqliteRow,
    model: Model,
) -> Result<ComponentDefinition, StorageError> {
    let id_str: String = row.try_get("id")?;
    let id = parse_uuid(&id_str)?;

    let format_str: String = row.try_get("format")?;
    let format = ComponentFormat::from_str(&format_str).map_err(|_| {
        StorageError::InvalidData(format!("component {id}: unknown format '{format_str}'"))
    })?;

    let metadata_bytes: Vec<u8> = row.try_get("metadata")?;
    let metadata: Metadata =
        serde_json::from_slice(&metadata_bytes).map_err(|source| StorageError::Unmarshal {
            record: format!("component {id}"),
            field: "metadata",
            source,
        })?;

    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(ComponentDefinition {
        id: Some(id),
        type_meta: TypeMeta {
            kind: row.try_get("kind")?,
            api_version: row.try_get("api_version")?,
        },
        display_name: row.try_get("display_name")?,
        format,
        metadata,
        model,
        schema: row.try_get("schema")?,
        created_at: DateTime::from_timestamp_millis(created_at),
        updated_at: DateTime::from_timestamp_millis(updated_at),
    })
}
