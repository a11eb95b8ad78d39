//! Column to Django field translation.
//!
//! Each column is dispatched on its type family, in a fixed order, to a
//! field constructor. Dispatch order matters because families overlap: a
//! small integer is also an integer, unicode text is also a string.
//!
//! # Design
//!
//! Dispatch is a lookup over [`DISPATCH_ORDER`] rather than a chain of type
//! checks, so the order is data that tests can inspect. Every constructor
//! receives the option set produced by [`crate::dialect::resolve`] and owns
//! it from then on.

use serde::Serialize;
use tracing::debug;

use crate::core::schema::{Column, ColumnType, Table, TypeFamily};
use crate::core::value::{OptionSet, OptionValue};
use crate::dialect;
use crate::error::{PolyjuiceError, Result};

use super::related::{self, ForeignKeyField};

/// Order in which type families are tried.
pub const DISPATCH_ORDER: &[TypeFamily] = &[
    TypeFamily::Boolean,
    TypeFamily::SmallInteger,
    TypeFamily::BigInteger,
    TypeFamily::Integer,
    TypeFamily::Uuid,
    TypeFamily::Numeric,
    TypeFamily::Float,
    TypeFamily::Text,
    TypeFamily::String,
    TypeFamily::DateTime,
    TypeFamily::Date,
    TypeFamily::Time,
];

/// Kind of Django field, with its type-specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "class")]
pub enum FieldKind {
    // ===== Keys =====
    #[serde(rename = "AutoField")]
    Auto,
    #[serde(rename = "BigAutoField")]
    BigAuto,
    #[serde(rename = "ForeignKey")]
    ForeignKey(ForeignKeyField),

    // ===== Numeric =====
    #[serde(rename = "SmallIntegerField")]
    SmallInteger,
    #[serde(rename = "IntegerField")]
    Integer,
    #[serde(rename = "BigIntegerField")]
    BigInteger,
    #[serde(rename = "FloatField")]
    Float,
    #[serde(rename = "DecimalField")]
    Decimal {
        max_digits: u32,
        decimal_places: u32,
    },

    // ===== Boolean =====
    #[serde(rename = "BooleanField")]
    Boolean,
    #[serde(rename = "NullBooleanField")]
    NullBoolean,

    // ===== Text =====
    #[serde(rename = "CharField")]
    Char { max_length: u32 },
    #[serde(rename = "TextField")]
    Text,

    // ===== Special =====
    #[serde(rename = "UUIDField")]
    Uuid,
    #[serde(rename = "DateField")]
    Date,
    #[serde(rename = "DateTimeField")]
    DateTime,
    #[serde(rename = "TimeField")]
    Time,
}

impl FieldKind {
    /// Django field class name.
    pub fn django_class(&self) -> &'static str {
        match self {
            FieldKind::Auto => "AutoField",
            FieldKind::BigAuto => "BigAutoField",
            FieldKind::ForeignKey(_) => "ForeignKey",
            FieldKind::SmallInteger => "SmallIntegerField",
            FieldKind::Integer => "IntegerField",
            FieldKind::BigInteger => "BigIntegerField",
            FieldKind::Float => "FloatField",
            FieldKind::Decimal { .. } => "DecimalField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::NullBoolean => "NullBooleanField",
            FieldKind::Char { .. } => "CharField",
            FieldKind::Text => "TextField",
            FieldKind::Uuid => "UUIDField",
            FieldKind::Date => "DateField",
            FieldKind::DateTime => "DateTimeField",
            FieldKind::Time => "TimeField",
        }
    }

    /// Check if this is an auto-incrementing key.
    pub fn is_auto(&self) -> bool {
        matches!(self, FieldKind::Auto | FieldKind::BigAuto)
    }
}

/// A translated Django field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Field class and its type-specific arguments.
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Keyword options (`null`, `default`, `help_text`, ...).
    pub options: OptionSet,
}

impl Field {
    /// Create a field from a kind and its options.
    pub fn new(kind: FieldKind, options: OptionSet) -> Self {
        Self { kind, options }
    }

    /// Auto-incrementing primary key with the fixed key options.
    pub fn auto(big: bool) -> Self {
        let mut options = OptionSet::new();
        options.insert("auto_created", true);
        options.insert("primary_key", true);
        options.insert("serialize", false);
        options.insert("verbose_name", "ID");
        let kind = if big { FieldKind::BigAuto } else { FieldKind::Auto };
        Self::new(kind, options)
    }

    /// The `null` option.
    pub fn null(&self) -> Option<bool> {
        self.options.get_bool("null")
    }

    /// The `unique` option.
    pub fn unique(&self) -> Option<bool> {
        self.options.get_bool("unique")
    }

    /// Whether the field is a primary key.
    pub fn primary_key(&self) -> bool {
        self.options.get_bool("primary_key").unwrap_or(false)
    }

    /// The `default` option.
    pub fn default(&self) -> Option<&OptionValue> {
        self.options.get("default")
    }

    /// The `verbose_name` option.
    pub fn verbose_name(&self) -> Option<&str> {
        self.options.get_str("verbose_name")
    }

    /// The `blank` option.
    pub fn blank(&self) -> Option<bool> {
        self.options.get_bool("blank")
    }

    /// The `editable` option.
    pub fn editable(&self) -> Option<bool> {
        self.options.get_bool("editable")
    }

    /// Foreign key target, for `ForeignKey` fields.
    pub fn foreign_key(&self) -> Option<&ForeignKeyField> {
        match &self.kind {
            FieldKind::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }
}

/// Translate a column into a named Django field.
///
/// The name is the column's `field_name` option when set, otherwise the
/// column name. Repeated calls on the same column return equal results.
pub fn to_field(table: &Table, column: &Column) -> Result<(String, Field)> {
    let mut options = dialect::resolve(table, column)?;
    let name = dialect::split_field_name(table, column, &mut options)?
        .unwrap_or_else(|| column.name.clone());

    let family = DISPATCH_ORDER
        .iter()
        .copied()
        .find(|family| column.column_type.is_a(*family));

    let mut field = match family {
        Some(TypeFamily::Boolean) => boolean_field(column, options),
        Some(TypeFamily::SmallInteger) => Field::new(FieldKind::SmallInteger, options),
        Some(TypeFamily::BigInteger) => {
            if column.primary_key {
                Field::auto(true)
            } else {
                Field::new(FieldKind::BigInteger, options)
            }
        }
        Some(TypeFamily::Integer) => integer_field(table, column, options)?,
        Some(TypeFamily::Uuid) => uuid_field(table, column, options)?,
        Some(TypeFamily::Numeric) => decimal_field(table, column, options)?,
        Some(TypeFamily::Float) => Field::new(FieldKind::Float, options),
        Some(TypeFamily::Text) => Field::new(FieldKind::Text, options),
        Some(TypeFamily::String) => char_field(table, column, options)?,
        Some(TypeFamily::DateTime) => Field::new(FieldKind::DateTime, options),
        Some(TypeFamily::Date) => Field::new(FieldKind::Date, options),
        Some(TypeFamily::Time) => Field::new(FieldKind::Time, options),
        None => {
            return Err(PolyjuiceError::UnsupportedColumnType {
                table: table.name.clone(),
                column: column.name.clone(),
                type_name: column.column_type.to_string(),
            })
        }
    };

    if column.primary_key && !field.kind.is_auto() {
        field.options.insert("primary_key", true);
    }

    debug!(
        "Table {}: column {} ({}) -> {} {}",
        table.name,
        column.name,
        column.column_type,
        name,
        field.kind.django_class()
    );

    Ok((name, field))
}

fn boolean_field(column: &Column, options: OptionSet) -> Field {
    if column.is_nullable() {
        Field::new(FieldKind::NullBoolean, options)
    } else {
        Field::new(FieldKind::Boolean, options)
    }
}

fn integer_field(table: &Table, column: &Column, options: OptionSet) -> Result<Field> {
    if column.primary_key {
        return Ok(Field::auto(false));
    }
    if !column.foreign_keys.is_empty() {
        return related::to_foreign_key(table, column, options);
    }
    Ok(Field::new(FieldKind::Integer, options))
}

fn uuid_field(table: &Table, column: &Column, options: OptionSet) -> Result<Field> {
    match column.column_type {
        ColumnType::Uuid { as_uuid: true } => Ok(Field::new(FieldKind::Uuid, options)),
        _ => Err(PolyjuiceError::UuidColumnMissingArgument {
            table: table.name.clone(),
            column: column.name.clone(),
        }),
    }
}

fn decimal_field(table: &Table, column: &Column, options: OptionSet) -> Result<Field> {
    let ColumnType::Numeric {
        precision,
        scale,
        asdecimal,
    } = column.column_type
    else {
        return Err(PolyjuiceError::UnsupportedColumnType {
            table: table.name.clone(),
            column: column.name.clone(),
            type_name: column.column_type.to_string(),
        });
    };

    let (Some(max_digits), Some(decimal_places)) = (precision, scale) else {
        return Err(PolyjuiceError::MissingDecimalFieldArgument {
            table: table.name.clone(),
            column: column.name.clone(),
        });
    };

    if asdecimal == Some(false) {
        return Err(PolyjuiceError::InvalidDecimalFieldArgument {
            table: table.name.clone(),
            column: column.name.clone(),
        });
    }

    Ok(Field::new(
        FieldKind::Decimal {
            max_digits,
            decimal_places,
        },
        options,
    ))
}

fn char_field(table: &Table, column: &Column, options: OptionSet) -> Result<Field> {
    let max_length = column
        .column_type
        .length()
        .ok_or_else(|| PolyjuiceError::MissingStringLength {
            table: table.name.clone(),
            column: column.name.clone(),
        })?;
    Ok(Field::new(FieldKind::Char { max_length }, options))
}
