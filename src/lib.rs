//! Meshreg - content-addressed component registry
//!
//! This crate stores component definitions together with the heavier model
//! payload each one references. Many components share a model; the registry
//! keeps exactly one copy of each distinct model, identified by a hash of its
//! content, even when registrations race.
//!
//! # Architecture
//!
//! - **Content hashing**: deterministic model ids from canonical JSON
//! - **Model registry**: locked check-then-insert on the shared model table
//! - **Component store**: one row per registration, linked to its model
//! - **Filters**: name/version/model filters, ordering and pagination over
//!   the component-model join
//!
//! # Example
//!
//! ```rust,no_run
//! use meshreg::{ComponentDefinition, ComponentFilter, DatabaseEngine, Model, RegistryBuilder};
//!
//! # async fn run() -> Result<(), meshreg::StorageError> {
//! let handles = RegistryBuilder::new("data/meshreg.db")
//!     .engine(DatabaseEngine::Sqlite)
//!     .build()
//!     .await?;
//!
//! let model = Model::new("istio", "1.20.0");
//! let component = ComponentDefinition::new("Gateway", "networking.istio.io/v1beta1", model);
//! let id = handles.components.register(&component).await?;
//!
//! let found = handles
//!     .components
//!     .query(&ComponentFilter::by_name("Gateway"))
//!     .await?;
//! assert_eq!(found[0].id, Some(id));
//!
//! handles.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod storage;

pub use storage::{
    ComponentDefinition, ComponentFilter, ComponentFormat, ComponentStore, DatabaseEngine, Dedup,
    FilterError, Metadata, Model, ModelRegistry, OrderField, RegistryBuilder, RegistryHandles,
    SortOrder, StorageError, TypeMeta,
};
