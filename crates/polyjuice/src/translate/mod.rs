//! Translation engine from schema metadata to Django model parts.
//!
//! - [`fields`]: column type dispatch and field construction
//! - [`related`]: foreign key fields
//! - [`meta`]: model metadata and index translation
//!
//! Every operation is a pure function of its inputs: translating the same
//! column or table twice yields equal results.

pub mod fields;
pub mod meta;
pub mod related;

pub use fields::{to_field, Field, FieldKind, DISPATCH_ORDER};
pub use meta::{build_meta, convert_index, convert_indexes, ModelIndex, ModelMeta, UserMeta};
pub use related::{related_model_path, to_foreign_key, ForeignKeyField, OnDelete};
