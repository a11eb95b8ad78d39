//! Schema document validation.

use std::collections::HashSet;

use super::{Config, TableSpec};
use crate::core::identifier::validate_identifier;
use crate::core::schema::IndexExpression;
use crate::dialect;
use crate::error::{PolyjuiceError, Result};

/// Validate the schema document.
pub fn validate(config: &Config) -> Result<()> {
    validate_identifier(&config.render.app_label)
        .map_err(|e| PolyjuiceError::config(format!("render.app_label: {}", e)))?;

    let mut table_names = HashSet::new();
    for table in &config.tables {
        if table.name.is_empty() {
            return Err(PolyjuiceError::config("tables[].name is required"));
        }
        if !table_names.insert(table.name.as_str()) {
            return Err(PolyjuiceError::config(format!(
                "Table '{}' is defined more than once",
                table.name
            )));
        }
        validate_table(config, table)?;
    }

    let mut model_names = HashSet::new();
    for model in &config.models {
        validate_identifier(&model.name)
            .map_err(|e| PolyjuiceError::config(format!("models[].name: {}", e)))?;
        if !model_names.insert(model.name.as_str()) {
            return Err(PolyjuiceError::config(format!(
                "Model '{}' is defined more than once",
                model.name
            )));
        }
        if let Some(table) = &model.table {
            if config.table_spec(table).is_none() {
                return Err(PolyjuiceError::config(format!(
                    "Model '{}' references unknown table '{}'",
                    model.name, table
                )));
            }
        }
    }

    Ok(())
}

fn validate_table(config: &Config, table: &TableSpec) -> Result<()> {
    if table.columns.is_empty() {
        return Err(PolyjuiceError::config(format!(
            "Table '{}' must have at least one column",
            table.name
        )));
    }

    let registry = dialect::init();
    let mut column_names = HashSet::new();
    for column in &table.columns {
        if column.name.is_empty() {
            return Err(PolyjuiceError::config(format!(
                "Table '{}': columns[].name is required",
                table.name
            )));
        }
        if !column_names.insert(column.name.as_str()) {
            return Err(PolyjuiceError::config(format!(
                "Table '{}': column '{}' is defined more than once",
                table.name, column.name
            )));
        }

        for key in column.options.keys() {
            registry.split_kwarg(key).map_err(|e| {
                PolyjuiceError::config(format!(
                    "Table '{}' column '{}': {}",
                    table.name, column.name, e
                ))
            })?;
        }

        if let Some(fk) = &column.foreign_key {
            if let Some(target) = config.table_spec(&fk.table) {
                if !target.columns.iter().any(|c| c.name == fk.column) {
                    return Err(PolyjuiceError::config(format!(
                        "Table '{}' column '{}': foreign key references unknown column '{}'",
                        table.name, column.name, fk
                    )));
                }
            }
        }
    }

    let mut index_names = HashSet::new();
    for index in &table.indexes {
        if !index_names.insert(index.name.as_str()) {
            return Err(PolyjuiceError::config(format!(
                "Table '{}': index '{}' is defined more than once",
                table.name, index.name
            )));
        }
        if index.expressions.is_empty() {
            return Err(PolyjuiceError::config(format!(
                "Table '{}': index '{}' has no expressions",
                table.name, index.name
            )));
        }
        for expression in &index.expressions {
            if let Some(missing) = unknown_column(expression, &column_names) {
                return Err(PolyjuiceError::config(format!(
                    "Table '{}': index '{}' references unknown column '{}'",
                    table.name, index.name, missing
                )));
            }
        }
    }

    Ok(())
}

/// First column referenced by an expression that is not in `columns`.
fn unknown_column<'a>(expression: &'a IndexExpression, columns: &HashSet<&str>) -> Option<&'a str> {
    match expression {
        IndexExpression::Column(name) => (!columns.contains(name.as_str())).then_some(name.as_str()),
        IndexExpression::Unary { element, .. } => unknown_column(element, columns),
        IndexExpression::Function { args, .. } => {
            args.iter().find_map(|arg| unknown_column(arg, columns))
        }
    }
}
