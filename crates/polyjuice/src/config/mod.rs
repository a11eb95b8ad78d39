//! Schema document loading, validation and conversion.
//!
//! A schema document is a YAML file listing tables and the models to build
//! from them. Loading validates the document; [`Config::placeholders`] turns
//! it into [`ModelPlaceholder`]s ready for assembly.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::schema::{Column, ColumnType, Index, Table};
use crate::dialect::{self, DialectRegistry};
use crate::error::{PolyjuiceError, Result};
use crate::model::ModelPlaceholder;

impl Config {
    /// Load a schema document from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a schema document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the document.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Compute a SHA256 fingerprint of the document.
    pub fn hash(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Find a table definition by name.
    pub fn table_spec(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Build every table, in document order.
    pub fn tables(&self) -> Result<Vec<Table>> {
        let registry = dialect::init();
        self.tables.iter().map(|t| t.to_table(registry)).collect()
    }

    /// Build every model placeholder, in document order.
    ///
    /// A model naming no table yields a placeholder without one; assembling
    /// it reports the missing table.
    pub fn placeholders(&self) -> Result<Vec<ModelPlaceholder>> {
        self.models.iter().map(|m| self.placeholder_for(m)).collect()
    }

    /// Build the placeholder of one model.
    pub fn placeholder(&self, name: &str) -> Result<ModelPlaceholder> {
        let spec = self
            .models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| PolyjuiceError::config(format!("Unknown model '{}'", name)))?;
        self.placeholder_for(spec)
    }

    fn placeholder_for(&self, spec: &ModelSpec) -> Result<ModelPlaceholder> {
        let module = spec
            .module
            .clone()
            .unwrap_or_else(|| format!("{}.models", self.render.app_label));

        let mut placeholder = ModelPlaceholder::new(spec.name.clone()).module(module);
        placeholder.methods = spec.methods.clone();
        placeholder.meta = spec.meta.clone();

        if let Some(table_name) = &spec.table {
            let table_spec = self.table_spec(table_name).ok_or_else(|| {
                PolyjuiceError::config(format!(
                    "Model '{}' references unknown table '{}'",
                    spec.name, table_name
                ))
            })?;
            placeholder = placeholder.table(table_spec.to_table(dialect::init())?);
        }

        Ok(placeholder)
    }
}

impl TableSpec {
    /// Build the table descriptor.
    pub fn to_table(&self, registry: &DialectRegistry) -> Result<Table> {
        let mut table = Table::new(self.name.clone());
        for column in &self.columns {
            table = table.column(column.to_column(registry)?);
        }
        for index in &self.indexes {
            let mut converted = Index::new(index.name.clone());
            for expression in &index.expressions {
                converted = converted.expression(expression.clone());
            }
            table = table.index(converted);
        }
        Ok(table)
    }
}

impl ColumnSpec {
    /// The column type described by `type` and its parameters.
    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_parts(
            &self.type_name,
            self.length,
            self.precision,
            self.scale,
            self.asdecimal,
            self.as_uuid,
        )
    }

    /// Build the column descriptor.
    pub fn to_column(&self, registry: &DialectRegistry) -> Result<Column> {
        let mut column = Column::new(self.name.clone(), self.column_type());
        column.nullable = self.nullable;
        column.unique = self.unique;
        column.primary_key = self.primary_key;
        column.default = self.default.clone();
        column.foreign_keys.extend(self.foreign_key.clone());

        for (key, value) in &self.options {
            column = column.kwarg_in(registry, key, value.clone())?;
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnDefault;
    use crate::core::value::OptionValue;

    const SCHEMA: &str = r#"
render:
  app_label: hogwarts
tables:
  - name: hogwarts__house
    columns:
      - name: id
        type: Integer
        primary_key: true
      - name: name
        type: String
        length: 30
        nullable: false
        options:
          django_help_text: House name
  - name: hogwarts__wizard
    columns:
      - name: id
        type: BigInteger
        primary_key: true
      - name: house_id
        type: Integer
        foreign_key: hogwarts__house.id
        options:
          django_on_delete: CASCADE
      - name: created
        type: DateTime
        default: {callable: django.utils.timezone.now}
    indexes:
      - name: ix_wizard_created
        expressions: ["created.desc()"]
models:
  - name: House
    table: hogwarts__house
    meta:
      ordering: [name]
    methods:
      - name: __str__
        source: |
          def __str__(self):
              return self.name
  - name: Wizard
    table: hogwarts__wizard
    module: hogwarts.wizards
"#;

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        assert_eq!(config.render.app_label, "hogwarts");
        assert!(config.render.header);
        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn test_tables() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        let tables = config.tables().unwrap();
        let house = &tables[0];
        let name = house.find_column("name").unwrap();
        assert_eq!(name.column_type, ColumnType::string(30));
        assert_eq!(name.nullable, Some(false));
        assert_eq!(
            name.dialect_options.get("django", "help_text"),
            Some(&OptionValue::from("House name"))
        );

        let wizard = &tables[1];
        let house_id = wizard.find_column("house_id").unwrap();
        assert_eq!(house_id.foreign_keys[0].table, "hogwarts__house");
        assert!(matches!(
            wizard.find_column("created").unwrap().default,
            Some(ColumnDefault::Callable(_))
        ));
        assert_eq!(wizard.indexes[0].expressions[0].to_string(), "created.desc()");
    }

    #[test]
    fn test_placeholders() {
        let config = Config::from_yaml(SCHEMA).unwrap();
        let placeholders = config.placeholders().unwrap();
        assert_eq!(placeholders[0].module, "hogwarts.models");
        assert_eq!(placeholders[0].methods[0].name, "__str__");
        assert!(placeholders[0].meta.is_some());
        assert_eq!(placeholders[1].module, "hogwarts.wizards");
        assert_eq!(
            placeholders[1].table.as_ref().map(|t| t.name.as_str()),
            Some("hogwarts__wizard")
        );

        assert!(config.placeholder("Wizard").is_ok());
        assert!(config.placeholder("Muggle").is_err());
    }

    #[test]
    fn test_model_without_table() {
        let yaml = "models:\n  - name: Ghost\n";
        let config = Config::from_yaml(yaml).unwrap();
        let placeholder = config.placeholder("Ghost").unwrap();
        assert!(placeholder.table.is_none());
    }

    #[test]
    fn test_hash_is_stable() {
        let first = Config::from_yaml(SCHEMA).unwrap().hash();
        let second = Config::from_yaml(SCHEMA).unwrap().hash();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let other = Config::from_yaml("models: []\n").unwrap().hash();
        assert_ne!(first, other);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/schema.yaml").unwrap_err();
        assert!(matches!(err, PolyjuiceError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, SCHEMA).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.tables[0].name, "hogwarts__house");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("tables: [").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG_ERROR);

        let err = Config::from_yaml(
            "tables:\n  - name: t\n    columns:\n      - name: c\n        type: Integer\n        foreign_key: nodot\n",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG_ERROR);
    }
}
