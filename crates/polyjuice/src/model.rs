//! Model assembly.
//!
//! A [`ModelPlaceholder`] names a model and carries its table, optional user
//! metadata and hand-written methods. [`model`] turns it into a [`Model`]:
//! one field per column, metadata bound to the table, and the methods carried
//! over unchanged.
//!
//! # Usage
//!
//! ```rust
//! use polyjuice::core::{Column, ColumnType, Table};
//! use polyjuice::model::{model, Method, ModelPlaceholder};
//!
//! polyjuice::init();
//! let table = Table::new("wizards")
//!     .column(Column::new("id", ColumnType::Integer).primary_key())
//!     .column(Column::new("name", ColumnType::string(50)));
//! let placeholder = ModelPlaceholder::new("Wizard")
//!     .table(table)
//!     .method(Method::new("__str__", "def __str__(self):\n    return self.name\n"));
//!
//! let wizard = model(&placeholder).unwrap();
//! assert_eq!(wizard.meta.db_table, "wizards");
//! assert_eq!(wizard.field("id").unwrap().kind.django_class(), "AutoField");
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::schema::Table;
use crate::error::{PolyjuiceError, Result};
use crate::translate::{build_meta, to_field, Field, ModelMeta, UserMeta};

/// Attribute names every generated model defines itself.
pub const RESERVED_ATTRIBUTES: &[&str] = &["Meta", "__module__", "__table__"];

/// A hand-written model method, carried over as source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Method name.
    pub name: String,

    /// Full source of the method definition.
    pub source: String,
}

impl Method {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Declaration of a model to build from a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPlaceholder {
    /// Model class name.
    pub name: String,

    /// Module the model belongs to.
    pub module: String,

    /// Source table.
    pub table: Option<Table>,

    /// User metadata.
    pub meta: Option<UserMeta>,

    /// Methods to carry over, in order.
    pub methods: Vec<Method>,
}

impl ModelPlaceholder {
    /// Create a placeholder with no table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: "models".to_string(),
            ..Self::default()
        }
    }

    /// Set the module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Set the source table.
    pub fn table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Set the user metadata.
    pub fn meta(mut self, meta: UserMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Add a method.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }
}

/// A field of an assembled model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelField {
    /// Field name in the model.
    pub name: String,

    /// Source column name.
    pub column: String,

    /// Translated field.
    pub field: Field,
}

/// An assembled Django model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    pub module: String,

    /// Fields in column order.
    pub fields: Vec<ModelField>,

    pub meta: ModelMeta,
    pub methods: Vec<Method>,
}

impl Model {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.field)
    }

    /// Field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Look up a carried-over method by name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Assemble a model from a placeholder and its own table.
pub fn model(placeholder: &ModelPlaceholder) -> Result<Model> {
    let table = placeholder
        .table
        .as_ref()
        .ok_or_else(|| PolyjuiceError::MissingTableDefinition {
            model: placeholder.name.clone(),
        })?;
    model_with_table(placeholder, table)
}

/// Assemble a model from a placeholder and an explicit table.
pub fn model_with_table(placeholder: &ModelPlaceholder, table: &Table) -> Result<Model> {
    let meta = build_meta(table, placeholder.meta.as_ref())?;

    let mut fields: Vec<ModelField> = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        let (name, field) = to_field(table, column)?;
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) || fields.iter().any(|f| f.name == name) {
            return Err(duplicate(placeholder, &name));
        }
        fields.push(ModelField {
            name,
            column: column.name.clone(),
            field,
        });
    }

    let mut seen: Vec<&str> = RESERVED_ATTRIBUTES.to_vec();
    seen.extend(fields.iter().map(|f| f.name.as_str()));
    for method in &placeholder.methods {
        if seen.contains(&method.name.as_str()) {
            return Err(duplicate(placeholder, &method.name));
        }
        seen.push(&method.name);
    }

    info!(
        "Assembled model {} from table {} ({} fields, {} indexes, {} methods)",
        placeholder.name,
        table.name,
        fields.len(),
        meta.indexes.len(),
        placeholder.methods.len()
    );

    Ok(Model {
        name: placeholder.name.clone(),
        module: placeholder.module.clone(),
        fields,
        meta,
        methods: placeholder.methods.clone(),
    })
}

fn duplicate(placeholder: &ModelPlaceholder, name: &str) -> PolyjuiceError {
    PolyjuiceError::DuplicateAttribute {
        model: placeholder.name.clone(),
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, Index};
    use crate::translate::FieldKind;

    fn houses() -> Table {
        Table::new("hogwarts__house")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::string(30)).nullable(false))
    }

    fn wizards() -> Table {
        Table::new("hogwarts__wizard")
            .column(Column::new("id", ColumnType::BigInteger).primary_key())
            .column(Column::new("name", ColumnType::string(50)).unique(true))
            .column(
                Column::new("house_id", ColumnType::Integer)
                    .foreign_key("hogwarts__house.id")
                    .unwrap()
                    .dialect_option("django", "on_delete", "CASCADE")
                    .dialect_option("django", "field_name", "house"),
            )
            .index(Index::new("ix_wizard_name").desc("name"))
    }

    #[test]
    fn test_missing_table_definition() {
        let err = model(&ModelPlaceholder::new("Wizard")).unwrap_err();
        assert!(matches!(
            err,
            PolyjuiceError::MissingTableDefinition { ref model } if model == "Wizard"
        ));
    }

    #[test]
    fn test_model_fields_follow_column_order() {
        let wizard = model(&ModelPlaceholder::new("Wizard").table(wizards())).unwrap();
        assert_eq!(
            wizard.field_names().collect::<Vec<_>>(),
            vec!["id", "name", "house"]
        );
        assert_eq!(wizard.field("id").unwrap().kind, FieldKind::BigAuto);
        assert_eq!(wizard.field("house").unwrap().foreign_key().unwrap().to, "hogwarts.house");
        assert_eq!(wizard.fields[2].column, "house_id");
        assert_eq!(wizard.module, "models");
    }

    #[test]
    fn test_model_meta() {
        let wizard = model(&ModelPlaceholder::new("Wizard").table(wizards())).unwrap();
        assert_eq!(wizard.meta.db_table, "hogwarts__wizard");
        assert_eq!(wizard.meta.indexes.len(), 1);
        assert_eq!(wizard.meta.indexes[0].fields, vec!["-name"]);
    }

    #[test]
    fn test_model_with_explicit_table() {
        let placeholder = ModelPlaceholder::new("House").module("hogwarts.models");
        let house = model_with_table(&placeholder, &houses()).unwrap();
        assert_eq!(house.meta.db_table, "hogwarts__house");
        assert_eq!(house.module, "hogwarts.models");
        assert_eq!(house.field("name").unwrap().null(), Some(false));
    }

    #[test]
    fn test_methods_are_carried_over() {
        let placeholder = ModelPlaceholder::new("House")
            .table(houses())
            .method(Method::new("__str__", "def __str__(self):\n    return self.name\n"));
        let house = model(&placeholder).unwrap();
        let method = house.method("__str__").unwrap();
        assert_eq!(method.source, "def __str__(self):\n    return self.name\n");
    }

    #[test]
    fn test_meta_errors_propagate() {
        let placeholder = ModelPlaceholder::new("House").table(houses()).meta(UserMeta {
            abstract_model: true,
            ..UserMeta::default()
        });
        assert!(matches!(
            model(&placeholder).unwrap_err(),
            PolyjuiceError::AbstractModel { .. }
        ));
    }

    #[test]
    fn test_duplicate_field_names() {
        let table = houses().column(
            Column::new("title", ColumnType::string(30)).dialect_option("django", "field_name", "name"),
        );
        let err = model(&ModelPlaceholder::new("House").table(table)).unwrap_err();
        assert!(matches!(
            err,
            PolyjuiceError::DuplicateAttribute { ref name, .. } if name == "name"
        ));
    }

    #[test]
    fn test_method_shadowing_field() {
        let placeholder = ModelPlaceholder::new("House")
            .table(houses())
            .method(Method::new("name", "def name(self):\n    return 'x'\n"));
        assert!(matches!(
            model(&placeholder).unwrap_err(),
            PolyjuiceError::DuplicateAttribute { .. }
        ));

        let placeholder = ModelPlaceholder::new("House")
            .table(houses())
            .method(Method::new("Meta", "class Meta:\n    pass\n"));
        assert!(model(&placeholder).is_err());
    }

    #[test]
    fn test_each_call_builds_a_fresh_model() {
        let placeholder = ModelPlaceholder::new("Wizard").table(wizards());
        let first = model(&placeholder).unwrap();
        let second = model(&placeholder).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_model_serializes_to_json() {
        let wizard = model(&ModelPlaceholder::new("Wizard").table(wizards())).unwrap();
        let json = serde_json::to_value(&wizard).unwrap();
        assert_eq!(json["name"], "Wizard");
        assert_eq!(json["fields"][0]["field"]["class"], "BigAutoField");
        assert_eq!(json["fields"][2]["field"]["on_delete"], "CASCADE");
        assert_eq!(json["meta"]["db_table"], "hogwarts__wizard");
    }
}
