//! Foreign key translation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::schema::{Column, Table};
use crate::core::value::{OptionSet, OptionValue};
use crate::error::{PolyjuiceError, Result};

use super::fields::{Field, FieldKind};

/// Django `on_delete` policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnDelete {
    Cascade,
    Protect,
    SetNull,
    SetDefault,
    DoNothing,
}

impl OnDelete {
    /// All supported policies.
    pub const ALL: [OnDelete; 5] = [
        OnDelete::Cascade,
        OnDelete::Protect,
        OnDelete::SetNull,
        OnDelete::SetDefault,
        OnDelete::DoNothing,
    ];

    /// Policy name as written in options and in Django (`models.CASCADE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Protect => "PROTECT",
            OnDelete::SetNull => "SET_NULL",
            OnDelete::SetDefault => "SET_DEFAULT",
            OnDelete::DoNothing => "DO_NOTHING",
        }
    }
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OnDelete {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OnDelete::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Target of a Django `ForeignKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyField {
    /// Related model path (`app.Model` or `model`).
    pub to: String,

    /// Deletion policy.
    pub on_delete: OnDelete,

    /// Reverse accessor name override.
    pub related_name: Option<String>,
}

impl ForeignKeyField {
    /// App label of the related model, when the path is app-qualified.
    pub fn app_label(&self) -> Option<&str> {
        self.to.rsplit_once('.').map(|(app, _)| app)
    }
}

/// Derive a related model path from a table name.
///
/// Tables named `<app>__<model>` map to `<app>.<model>`; other names are
/// used unchanged.
pub fn related_model_path(table_name: &str) -> String {
    table_name.replace("__", ".")
}

/// Build a `ForeignKey` field for a column with a foreign key reference.
///
/// `related_model`, `on_delete` and `related_name` are taken out of the
/// option set; the remaining options stay on the field.
pub fn to_foreign_key(table: &Table, column: &Column, mut options: OptionSet) -> Result<Field> {
    let to = match options.remove("related_model") {
        Some(OptionValue::Str(path)) => path,
        Some(other) => {
            return Err(PolyjuiceError::invalid_option(
                &table.name,
                &column.name,
                "related_model",
                "a model path string",
                &other,
            ))
        }
        None => {
            let foreign_key = column.foreign_keys.first().ok_or_else(|| {
                PolyjuiceError::config(format!(
                    "Table {} column {} has no foreign key reference",
                    table.name, column.name
                ))
            })?;
            related_model_path(&foreign_key.table)
        }
    };

    let on_delete = match options.remove("on_delete") {
        None => {
            return Err(PolyjuiceError::MissingOnDeleteOption {
                table: table.name.clone(),
                column: column.name.clone(),
            })
        }
        Some(value) => value
            .as_str()
            .and_then(|s| s.parse::<OnDelete>().ok())
            .ok_or_else(|| PolyjuiceError::InvalidOnDeleteOption {
                table: table.name.clone(),
                column: column.name.clone(),
                value: value.to_string(),
            })?,
    };

    let related_name = match options.remove("related_name") {
        None => None,
        Some(OptionValue::Str(name)) => Some(name),
        Some(other) => {
            return Err(PolyjuiceError::invalid_option(
                &table.name,
                &column.name,
                "related_name",
                "a string",
                &other,
            ))
        }
    };

    Ok(Field::new(
        FieldKind::ForeignKey(ForeignKeyField {
            to,
            on_delete,
            related_name,
        }),
        options,
    ))
}
