//! # polyjuice
//!
//! Translate relational table metadata into Django model definitions, so one
//! schema can drive two ORMs.
//!
//! The library provides:
//!
//! - **Schema descriptors** for tables, typed columns, indexes and per-column
//!   `django_*` options
//! - **Field translation** from column types and constraints to Django fields,
//!   rejecting translations that would lose information
//! - **Model assembly** from a placeholder, its table and its methods
//! - **Schema documents** in YAML, validated on load
//! - **Rendering** of `models.py` modules and initial migrations
//!
//! ## Example
//!
//! ```rust
//! use polyjuice::core::{Column, ColumnType, Index, Table};
//! use polyjuice::{model, ModelPlaceholder};
//!
//! polyjuice::init();
//!
//! let table = Table::new("hogwarts__wizard")
//!     .column(Column::new("id", ColumnType::Integer).primary_key())
//!     .column(Column::new("name", ColumnType::string(50)).nullable(false))
//!     .column(
//!         Column::new("house_id", ColumnType::Integer)
//!             .foreign_key("hogwarts__house.id")?
//!             .kwarg("django_on_delete", "CASCADE")?,
//!     )
//!     .index(Index::new("ix_wizard_name").desc("name"));
//!
//! let wizard = model(&ModelPlaceholder::new("Wizard").table(table))?;
//! assert_eq!(wizard.meta.indexes[0].fields, vec!["-name"]);
//! assert_eq!(wizard.field("house_id").unwrap().foreign_key().unwrap().to, "hogwarts.house");
//! # Ok::<(), polyjuice::PolyjuiceError>(())
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod error;
pub mod model;
pub mod render;
pub mod translate;

// Re-exports for convenient access
pub use config::Config;
pub use dialect::{init, resolve, DialectRegistry};
pub use error::{ErrorKind, PolyjuiceError, Result};
pub use model::{model, model_with_table, Method, Model, ModelField, ModelPlaceholder};
pub use render::{MigrationWriter, ModelWriter, ModelsWriter, OutputFormat, RenderOptions};
pub use translate::{
    build_meta, convert_index, to_field, to_foreign_key, Field, FieldKind, ModelIndex, ModelMeta,
    OnDelete, UserMeta,
};
