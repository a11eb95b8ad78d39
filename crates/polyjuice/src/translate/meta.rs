//! Model metadata: table binding and index translation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::schema::{Index, IndexExpression, Table, UnaryModifier};
use crate::core::value::OptionValue;
use crate::dialect;
use crate::error::{PolyjuiceError, Result};

/// A Django `models.Index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIndex {
    /// Index name.
    pub name: String,

    /// Field names, `-` prefixed for descending order.
    pub fields: Vec<String>,
}

impl ModelIndex {
    /// Create an index over the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Metadata a user declares on a model placeholder.
///
/// `db_table` and `indexes` are derived from the table and may not be set;
/// abstract models cannot be translated. Any other option is copied to the
/// generated metadata unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<ModelIndex>>,

    #[serde(default, rename = "abstract")]
    pub abstract_model: bool,

    /// Other options (`ordering`, `verbose_name`, ...).
    #[serde(flatten)]
    pub options: BTreeMap<String, OptionValue>,
}

impl UserMeta {
    /// Create an empty user metadata block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

/// Generated model metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMeta {
    /// Table the model is bound to.
    pub db_table: String,

    /// Translated indexes, in table order.
    pub indexes: Vec<ModelIndex>,

    /// Options carried over from the user metadata.
    pub options: BTreeMap<String, OptionValue>,
}

/// Translate a table index into a model index.
///
/// Bare columns give their field name and `desc()` gives the `-` prefixed
/// field name. Other modifiers and function expressions are rejected.
pub fn convert_index(table: &Table, index: &Index) -> Result<ModelIndex> {
    let fields = index
        .expressions
        .iter()
        .map(|expression| index_field(table, index, expression))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Table {}: index {} -> fields {:?}",
        table.name, index.name, fields
    );

    Ok(ModelIndex::new(index.name.clone(), fields))
}

fn index_field(table: &Table, index: &Index, expression: &IndexExpression) -> Result<String> {
    match expression {
        IndexExpression::Column(name) => Ok(column_field_name(table, name)),
        IndexExpression::Unary { modifier, element } => {
            if *modifier != UnaryModifier::Desc {
                return Err(PolyjuiceError::InvalidIndexDefinition {
                    table: table.name.clone(),
                    index: index.name.clone(),
                });
            }
            match element.as_ref() {
                IndexExpression::Column(name) => Ok(format!("-{}", column_field_name(table, name))),
                _ => Err(PolyjuiceError::UnsupportedFunctionalIndex {
                    table: table.name.clone(),
                    index: index.name.clone(),
                }),
            }
        }
        IndexExpression::Function { .. } => Err(PolyjuiceError::UnsupportedFunctionalIndex {
            table: table.name.clone(),
            index: index.name.clone(),
        }),
    }
}

/// Field name of an indexed column, following its rename option.
fn column_field_name(table: &Table, column: &str) -> String {
    table
        .find_column(column)
        .map(dialect::field_name)
        .unwrap_or_else(|| column.to_string())
}

/// Translate every index of a table, in order.
pub fn convert_indexes(table: &Table) -> Result<Vec<ModelIndex>> {
    table
        .indexes
        .iter()
        .map(|index| convert_index(table, index))
        .collect()
}

/// Build the metadata of a model bound to a table.
pub fn build_meta(table: &Table, user_meta: Option<&UserMeta>) -> Result<ModelMeta> {
    let mut options = BTreeMap::new();

    if let Some(user_meta) = user_meta {
        if user_meta.abstract_model {
            return Err(PolyjuiceError::AbstractModel {
                table: table.name.clone(),
            });
        }
        if user_meta.db_table.is_some() {
            return Err(PolyjuiceError::MetaOverride {
                table: table.name.clone(),
                field: "db_table".to_string(),
            });
        }
        if user_meta.indexes.is_some() {
            return Err(PolyjuiceError::MetaOverride {
                table: table.name.clone(),
                field: "indexes".to_string(),
            });
        }
        options = user_meta.options.clone();
    }

    Ok(ModelMeta {
        db_table: table.name.clone(),
        indexes: convert_indexes(table)?,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType};

    fn test_table() -> Table {
        Table::new("test_table")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::string(50)))
            .column(Column::new("price", ColumnType::numeric(10, 2)))
            .column(
                Column::new("age", ColumnType::Integer)
                    .dialect_option("django", "field_name", "my_age"),
            )
    }

    #[test]
    fn test_simple_index() {
        let table = test_table();
        let index = Index::new("ix_name").column("name");
        let converted = convert_index(&table, &index).unwrap();
        assert_eq!(converted, ModelIndex::new("ix_name", vec!["name".to_string()]));
    }

    #[test]
    fn test_composite_index_keeps_order() {
        let table = test_table();
        let index = Index::new("ix_name_price").desc("name").column("price");
        let converted = convert_index(&table, &index).unwrap();
        assert_eq!(converted.fields, vec!["-name", "price"]);
    }

    #[test]
    fn test_index_uses_renamed_field() {
        let table = test_table();
        let index = Index::new("ix_age").desc("age");
        let converted = convert_index(&table, &index).unwrap();
        assert_eq!(converted.fields, vec!["-my_age"]);
    }

    #[test]
    fn test_invalid_unary_modifier() {
        let table = test_table();
        let index = Index::new("ix_name").expression(IndexExpression::parse("name.distinct()").unwrap());
        let err = convert_index(&table, &index).unwrap_err();
        assert!(matches!(err, PolyjuiceError::InvalidIndexDefinition { .. }));
        assert!(err.to_string().contains("`ix_name`"));
    }

    #[test]
    fn test_functional_index() {
        let table = test_table();
        let index = Index::new("ix_lower").expression(IndexExpression::parse("lower(name)").unwrap());
        assert!(matches!(
            convert_index(&table, &index).unwrap_err(),
            PolyjuiceError::UnsupportedFunctionalIndex { .. }
        ));

        let index =
            Index::new("ix_lower").expression(IndexExpression::parse("lower(name).desc()").unwrap());
        assert!(matches!(
            convert_index(&table, &index).unwrap_err(),
            PolyjuiceError::UnsupportedFunctionalIndex { .. }
        ));
    }

    #[test]
    fn test_build_meta() {
        let table = test_table().index(Index::new("ix_name").column("name"));
        let meta = build_meta(&table, None).unwrap();
        assert_eq!(meta.db_table, "test_table");
        assert_eq!(meta.indexes.len(), 1);
        assert!(meta.options.is_empty());
    }

    #[test]
    fn test_build_meta_keeps_user_options() {
        let user_meta = UserMeta::new()
            .option("ordering", vec!["-price"])
            .option("verbose_name", "Product");
        let meta = build_meta(&test_table(), Some(&user_meta)).unwrap();
        assert_eq!(meta.options.len(), 2);
        assert_eq!(
            meta.options.get("verbose_name"),
            Some(&OptionValue::from("Product"))
        );
    }

    #[test]
    fn test_build_meta_rejects_overrides() {
        let user_meta = UserMeta {
            db_table: Some("other".to_string()),
            ..UserMeta::default()
        };
        let err = build_meta(&test_table(), Some(&user_meta)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Table `test_table`: You cannot override Meta.db_table field."
        );

        let user_meta = UserMeta {
            indexes: Some(Vec::new()),
            ..UserMeta::default()
        };
        assert!(matches!(
            build_meta(&test_table(), Some(&user_meta)).unwrap_err(),
            PolyjuiceError::MetaOverride { ref field, .. } if field == "indexes"
        ));
    }

    #[test]
    fn test_build_meta_rejects_abstract() {
        let user_meta = UserMeta {
            abstract_model: true,
            ..UserMeta::default()
        };
        assert!(matches!(
            build_meta(&test_table(), Some(&user_meta)).unwrap_err(),
            PolyjuiceError::AbstractModel { .. }
        ));
    }

    #[test]
    fn test_user_meta_from_yaml() {
        let meta: UserMeta =
            serde_yaml::from_str("ordering: ['-name']\nabstract: true\n").unwrap();
        assert!(meta.abstract_model);
        assert!(meta.options.contains_key("ordering"));
        assert!(!meta.options.contains_key("abstract"));
    }
}
