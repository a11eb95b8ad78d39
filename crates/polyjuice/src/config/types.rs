//! Schema document type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::schema::{ColumnDefault, ForeignKeyRef, IndexExpression};
use crate::core::value::OptionValue;
use crate::model::Method;
use crate::translate::UserMeta;

/// Root schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Source tables.
    #[serde(default)]
    pub tables: Vec<TableSpec>,

    /// Models to build from the tables.
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Django app label (default: "app").
    #[serde(default = "default_app_label")]
    pub app_label: String,

    /// Emit a generated-file header (default: true).
    #[serde(default = "default_true")]
    pub header: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            app_label: default_app_label(),
            header: default_true(),
        }
    }
}

/// Table definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,

    /// Columns, in order.
    pub columns: Vec<ColumnSpec>,

    /// Indexes, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexSpec>,
}

/// Column definition.
///
/// `type` is a type name (`Integer`, `String`, `Numeric`, ...); the
/// type parameters sit next to it. Side-channel options are written with
/// their dialect prefix, e.g. `django_on_delete: CASCADE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,

    /// Type name.
    #[serde(rename = "type")]
    pub type_name: String,

    /// String length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Numeric precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Numeric scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Numeric values convert to decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asdecimal: Option<bool>,

    /// UUID values convert to native UUID objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_uuid: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    #[serde(default)]
    pub primary_key: bool,

    /// Default value; `{callable: path}` for a callable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,

    /// Foreign key reference (`table.column`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,

    /// Prefixed side-channel options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionValue>,
}

/// Index definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,

    /// Expressions (`name`, `name.desc()`, `lower(name)`), in order.
    pub expressions: Vec<IndexExpression>,
}

/// Model declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model class name.
    pub name: String,

    /// Name of the source table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Module (default: "<app_label>.models").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// User metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<UserMeta>,

    /// Methods to carry over.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Method>,
}

fn default_app_label() -> String {
    "app".to_string()
}

fn default_true() -> bool {
    true
}
