//! Storage Layer
//!
//! Content-addressed registry over SQLite:
//! - **Models**: shared records identified by a hash of their content, stored
//!   once no matter how many components reference them
//! - **Components**: one row per registration, each pointing at a model
//!
//! # Components
//!
//! - [`ModelRegistry`]: locked check-then-insert for models
//! - [`ComponentStore`]: registration, lookup and filtered queries
//! - [`ComponentFilter`]: declarative query description
//! - [`RegistryBuilder`] / [`RegistryHandles`]: initialization and lifecycle

mod builder;
pub mod component_store;
pub mod db;
mod error;
pub mod filter;
pub mod hash;
pub mod model_store;
mod schema;
mod types;

pub use builder::{IN_MEMORY, RegistryBuilder, RegistryHandles};
pub use component_store::ComponentStore;
pub use db::DatabaseEngine;
pub use error::StorageError;
pub use filter::{ComponentFilter, FilterError, OrderField, SortOrder};
pub use hash::derive_id;
pub use model_store::{Dedup, ModelRegistry};
pub use types::{ComponentDefinition, ComponentFormat, Metadata, Model, TypeMeta};
