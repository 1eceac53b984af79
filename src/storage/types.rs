//! Core data types for the registry.
//!
//! - [`Model`]: shared, content-addressed payload referenced by components
//! - [`ComponentDefinition`]: one registration, linked to exactly one model
//! - [`TypeMeta`]: kind and API version of a component
//! - [`ComponentFormat`]: encoding of a component's schema payload

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Free-form key/value metadata.
///
/// Ordered so that serialization is stable, which content hashing relies on.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A model shared by any number of components.
///
/// Two models with the same content are the same model: the id is derived
/// from every serialized field below and is itself excluded from the
/// serialized form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Content-derived id. `None` until registered or loaded.
    #[serde(skip)]
    pub id: Option<Uuid>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Model {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = sub_category.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Kind and API version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    pub kind: String,
    pub api_version: String,
}

/// Encoding of a component's schema payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ComponentFormat {
    /// Structured JSON (JSON Schema).
    #[default]
    Json,
    /// YAML.
    Yaml,
    /// CUE schema definition language.
    Cue,
}

/// A registered component definition.
///
/// The id is random and assigned on registration; two content-identical
/// definitions registered twice are two components sharing one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    /// Assigned by [`ComponentStore::register`](crate::storage::ComponentStore::register).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub format: ComponentFormat,
    #[serde(default)]
    pub metadata: Metadata,
    pub model: Model,
    #[serde(default)]
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ComponentDefinition {
    /// Create an unregistered component carrying the given model.
    pub fn new(kind: impl Into<String>, api_version: impl Into<String>, model: Model) -> Self {
        Self {
            id: None,
            type_meta: TypeMeta {
                kind: kind.into(),
                api_version: api_version.into(),
            },
            display_name: String::new(),
            format: ComponentFormat::default(),
            metadata: Metadata::new(),
            model,
            schema: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_format(mut self, format: ComponentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> &str {
        &self.type_meta.kind
    }

    pub fn api_version(&self) -> &str {
        &self.type_meta.api_version
    }
}
