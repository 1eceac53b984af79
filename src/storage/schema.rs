//! Database schema definitions.

use sqlx::SqlitePool;

use crate::storage::StorageError;

/// SQL statement for creating the models table (shared, content-addressed).
///
/// Primary key is the content-derived id; a row is written at most once per
/// distinct content and never updated afterwards.
pub const MODELS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id            TEXT PRIMARY KEY NOT NULL,
    name          TEXT NOT NULL,
    version       TEXT NOT NULL,
    display_name  TEXT NOT NULL DEFAULT '',
    category      TEXT NOT NULL DEFAULT '',
    sub_category  TEXT NOT NULL DEFAULT '',
    metadata      BLOB NOT NULL,
    created_at    INTEGER NOT NULL,
    updated_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_models_name_version ON models (name, version);
CREATE INDEX IF NOT EXISTS idx_models_created_at ON models (created_at);
"#;

/// SQL statement for creating the components table.
///
/// Every row references exactly one model; the foreign key is enforced by
/// the pool's `foreign_keys` pragma.
pub const COMPONENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS components (
    id            TEXT PRIMARY KEY NOT NULL,
    model_id      TEXT NOT NULL REFERENCES models (id),
    kind          TEXT NOT NULL,
    api_version   TEXT NOT NULL,
    display_name  TEXT NOT NULL DEFAULT '',
    format        TEXT NOT NULL,
    metadata      BLOB NOT NULL,
    schema        TEXT NOT NULL DEFAULT '',
    created_at    INTEGER NOT NULL,
    updated_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_components_kind ON components (kind);
CREATE INDEX IF NOT EXISTS idx_components_api_version ON components (api_version);
CREATE INDEX IF NOT EXISTS idx_components_model_id ON components (model_id);
CREATE INDEX IF NOT EXISTS idx_components_created_at ON components (created_at);
"#;

/// Initialize the database schema.
///
/// Creates all necessary tables and indexes if they don't exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::raw_sql(MODELS_TABLE_DDL).execute(pool).await?;
    sqlx::raw_sql(COMPONENTS_TABLE_DDL).execute(pool).await?;

    tracing::info!("Database schema initialized");
    Ok(())
}
