//! Schema metadata types for source tables, columns and indexes.
//!
//! These types describe a table the way a relational mapping toolkit does:
//! typed columns with structural constraints, foreign keys, ordered index
//! expressions, and per-column side-channel options grouped by dialect.
//! They are read-only inputs to the translation engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::{self, DialectRegistry};
use crate::error::{PolyjuiceError, Result};

use super::value::{CallableRef, OptionValue};

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions, in declaration order.
    pub columns: Vec<Column>,

    /// Index definitions, in declaration order.
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add an index.
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Find a column by name.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnDefault {
    /// Callable evaluated on insert (e.g. "datetime.date.today").
    Callable(CallableRef),
    /// Literal value.
    Scalar(OptionValue),
}

impl ColumnDefault {
    /// Convert the default to an option value.
    pub fn to_option_value(&self) -> OptionValue {
        match self {
            ColumnDefault::Callable(c) => OptionValue::Callable(c.clone()),
            ColumnDefault::Scalar(value) => value.clone(),
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Column type.
    pub column_type: ColumnType,

    /// Whether the column allows NULL. `None` means "not stated", which reads
    /// as nullable unless the column is part of the primary key.
    pub nullable: Option<bool>,

    /// Whether the column is unique. `None` means "not stated".
    pub unique: Option<bool>,

    /// Default value, if any.
    pub default: Option<ColumnDefault>,

    /// Whether the column is part of the primary key.
    pub primary_key: bool,

    /// Foreign key references.
    pub foreign_keys: Vec<ForeignKeyRef>,

    /// Side-channel options by dialect name.
    pub dialect_options: DialectOptions,
}

impl Column {
    /// Create a column with the given type and no constraints.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: None,
            unique: None,
            default: None,
            primary_key: false,
            foreign_keys: Vec::new(),
            dialect_options: DialectOptions::default(),
        }
    }

    /// Effective nullability.
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(!self.primary_key)
    }

    /// Set nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Set uniqueness.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Mark the column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Set a literal default value.
    pub fn default_value(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(ColumnDefault::Scalar(value.into()));
        self
    }

    /// Set a callable default.
    pub fn default_callable(mut self, path: impl Into<String>) -> Self {
        self.default = Some(ColumnDefault::Callable(CallableRef::new(path)));
        self
    }

    /// Add a foreign key reference in `table.column` form.
    pub fn foreign_key(mut self, target: &str) -> Result<Self> {
        self.foreign_keys.push(ForeignKeyRef::parse(target)?);
        Ok(self)
    }

    /// Set a side-channel option for an explicit dialect.
    pub fn dialect_option(
        mut self,
        dialect: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Self {
        self.dialect_options.insert(dialect, name, value);
        self
    }

    /// Set a side-channel option from a prefixed keyword such as
    /// `django_on_delete`, using the process-wide dialect registry.
    pub fn kwarg(self, key: &str, value: impl Into<OptionValue>) -> Result<Self> {
        match dialect::registry() {
            Some(registry) => self.kwarg_in(registry, key, value),
            None => Err(PolyjuiceError::UnknownDialectOption {
                argument: key.to_string(),
                dialect: key.split('_').next().unwrap_or(key).to_string(),
            }),
        }
    }

    /// Set a side-channel option from a prefixed keyword, using an explicit registry.
    pub fn kwarg_in(
        self,
        registry: &DialectRegistry,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<Self> {
        let (dialect, name) = registry.split_kwarg(key)?;
        Ok(self.dialect_option(dialect, name, value))
    }
}

/// Side-channel options grouped by dialect name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialectOptions(BTreeMap<String, BTreeMap<String, OptionValue>>);

impl DialectOptions {
    /// Set an option for a dialect.
    pub fn insert(
        &mut self,
        dialect: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) {
        self.0
            .entry(dialect.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Options for one dialect, in name order.
    pub fn for_dialect(&self, dialect: &str) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.get(dialect).into_iter().flat_map(|options| options.iter())
    }

    /// Get a single option.
    pub fn get(&self, dialect: &str, name: &str) -> Option<&OptionValue> {
        self.0.get(dialect).and_then(|options| options.get(name))
    }
}

/// Reference from a column to `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ForeignKeyRef {
    /// Referenced table name (may include a schema prefix).
    pub table: String,

    /// Referenced column name.
    pub column: String,
}

impl ForeignKeyRef {
    /// Parse a `table.column` (or `schema.table.column`) reference.
    pub fn parse(target: &str) -> Result<Self> {
        match target.rsplit_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok(Self {
                table: table.to_string(),
                column: column.to_string(),
            }),
            _ => Err(PolyjuiceError::config(format!(
                "Invalid foreign key reference {:?}: expected 'table.column'",
                target
            ))),
        }
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl TryFrom<String> for ForeignKeyRef {
    type Error = PolyjuiceError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ForeignKeyRef> for String {
    fn from(value: ForeignKeyRef) -> Self {
        value.to_string()
    }
}

/// Source column types.
///
/// Types form a hierarchy, described by [`TypeFamily`]: a small integer is
/// also an integer, unicode text is also text and a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    // ===== Boolean =====
    /// Boolean type.
    Boolean,

    // ===== Integer Types =====
    /// 16-bit integer.
    SmallInteger,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,

    // ===== Numeric =====
    /// Floating point number.
    Float,
    /// Fixed-point decimal.
    Numeric {
        /// Total number of digits.
        precision: Option<u32>,
        /// Digits after the decimal point.
        scale: Option<u32>,
        /// Whether values convert to decimals. `None` means "not stated".
        asdecimal: Option<bool>,
    },

    // ===== String Types =====
    /// Bounded string.
    String {
        /// Maximum length in characters.
        length: Option<u32>,
    },
    /// Bounded unicode string.
    Unicode {
        /// Maximum length in characters.
        length: Option<u32>,
    },
    /// Unbounded text.
    Text,
    /// Unbounded unicode text.
    UnicodeText,

    // ===== Special Types =====
    /// PostgreSQL UUID.
    Uuid {
        /// Whether values convert to native UUID objects.
        as_uuid: bool,
    },

    // ===== Date/Time Types =====
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Time only.
    Time,

    // ===== Fallback =====
    /// Any other type, by name.
    Other(String),
}

/// Type family used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Boolean,
    SmallInteger,
    BigInteger,
    Integer,
    Uuid,
    Numeric,
    Float,
    Text,
    String,
    DateTime,
    Date,
    Time,
}

impl ColumnType {
    /// Create a numeric type with precision and scale.
    pub fn numeric(precision: u32, scale: u32) -> Self {
        ColumnType::Numeric {
            precision: Some(precision),
            scale: Some(scale),
            asdecimal: None,
        }
    }

    /// Create a string type with a length.
    pub fn string(length: u32) -> Self {
        ColumnType::String {
            length: Some(length),
        }
    }

    /// Families this type belongs to, most specific first.
    pub fn families(&self) -> &'static [TypeFamily] {
        use TypeFamily as F;
        match self {
            ColumnType::Boolean => &[F::Boolean],
            ColumnType::SmallInteger => &[F::SmallInteger, F::Integer],
            ColumnType::Integer => &[F::Integer],
            ColumnType::BigInteger => &[F::BigInteger, F::Integer],
            ColumnType::Float => &[F::Float],
            ColumnType::Numeric { .. } => &[F::Numeric],
            ColumnType::String { .. } => &[F::String],
            ColumnType::Unicode { .. } => &[F::String],
            ColumnType::Text => &[F::Text, F::String],
            ColumnType::UnicodeText => &[F::Text, F::String],
            ColumnType::Uuid { .. } => &[F::Uuid],
            ColumnType::Date => &[F::Date],
            ColumnType::DateTime => &[F::DateTime],
            ColumnType::Time => &[F::Time],
            ColumnType::Other(_) => &[],
        }
    }

    /// Check if this type belongs to a family.
    pub fn is_a(&self, family: TypeFamily) -> bool {
        self.families().contains(&family)
    }

    /// Maximum length for string types.
    pub fn length(&self) -> Option<u32> {
        match self {
            ColumnType::String { length } | ColumnType::Unicode { length } => *length,
            _ => None,
        }
    }

    /// Parse a type from its name and parameters, as written in a schema document.
    ///
    /// Unknown names become [`ColumnType::Other`], which the translator rejects.
    pub fn from_parts(
        name: &str,
        length: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
        asdecimal: Option<bool>,
        as_uuid: Option<bool>,
    ) -> Self {
        match name.to_lowercase().as_str() {
            "boolean" | "bool" => ColumnType::Boolean,
            "smallinteger" | "smallint" => ColumnType::SmallInteger,
            "integer" | "int" => ColumnType::Integer,
            "biginteger" | "bigint" => ColumnType::BigInteger,
            "float" => ColumnType::Float,
            "numeric" | "decimal" => ColumnType::Numeric {
                precision,
                scale,
                asdecimal,
            },
            "string" | "varchar" => ColumnType::String { length },
            "unicode" | "nvarchar" => ColumnType::Unicode { length },
            "text" => ColumnType::Text,
            "unicodetext" => ColumnType::UnicodeText,
            "uuid" => ColumnType::Uuid {
                as_uuid: as_uuid.unwrap_or(false),
            },
            "date" => ColumnType::Date,
            "datetime" | "timestamp" => ColumnType::DateTime,
            "time" => ColumnType::Time,
            _ => ColumnType::Other(name.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Boolean => write!(f, "Boolean"),
            ColumnType::SmallInteger => write!(f, "SmallInteger"),
            ColumnType::Integer => write!(f, "Integer"),
            ColumnType::BigInteger => write!(f, "BigInteger"),
            ColumnType::Float => write!(f, "Float"),
            ColumnType::Numeric {
                precision, scale, ..
            } => match (precision, scale) {
                (Some(p), Some(s)) => write!(f, "Numeric({},{})", p, s),
                _ => write!(f, "Numeric"),
            },
            ColumnType::String { length: Some(n) } => write!(f, "String({})", n),
            ColumnType::String { length: None } => write!(f, "String"),
            ColumnType::Unicode { length: Some(n) } => write!(f, "Unicode({})", n),
            ColumnType::Unicode { length: None } => write!(f, "Unicode"),
            ColumnType::Text => write!(f, "Text"),
            ColumnType::UnicodeText => write!(f, "UnicodeText"),
            ColumnType::Uuid { .. } => write!(f, "UUID"),
            ColumnType::Date => write!(f, "Date"),
            ColumnType::DateTime => write!(f, "DateTime"),
            ColumnType::Time => write!(f, "Time"),
            ColumnType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Indexed expressions, in order.
    pub expressions: Vec<IndexExpression>,
}

impl Index {
    /// Create an index with no expressions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expressions: Vec::new(),
        }
    }

    /// Add a bare column expression.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.expressions.push(IndexExpression::Column(name.into()));
        self
    }

    /// Add a descending column expression.
    pub fn desc(mut self, name: impl Into<String>) -> Self {
        self.expressions.push(IndexExpression::Unary {
            modifier: UnaryModifier::Desc,
            element: Box::new(IndexExpression::Column(name.into())),
        });
        self
    }

    /// Add an arbitrary expression.
    pub fn expression(mut self, expression: IndexExpression) -> Self {
        self.expressions.push(expression);
        self
    }
}

/// Unary modifier wrapping an index element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryModifier {
    Asc,
    Desc,
    Distinct,
    NullsFirst,
    NullsLast,
}

impl UnaryModifier {
    /// Method name used in the expression syntax.
    pub fn method_name(&self) -> &'static str {
        match self {
            UnaryModifier::Asc => "asc",
            UnaryModifier::Desc => "desc",
            UnaryModifier::Distinct => "distinct",
            UnaryModifier::NullsFirst => "nulls_first",
            UnaryModifier::NullsLast => "nulls_last",
        }
    }

    fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(UnaryModifier::Asc),
            "desc" => Some(UnaryModifier::Desc),
            "distinct" => Some(UnaryModifier::Distinct),
            "nulls_first" | "nullsfirst" => Some(UnaryModifier::NullsFirst),
            "nulls_last" | "nullslast" => Some(UnaryModifier::NullsLast),
            _ => None,
        }
    }
}

/// An index expression.
///
/// Written in schema documents as `name`, `name.desc()`, `name.distinct()`
/// or `lower(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndexExpression {
    /// Bare column reference.
    Column(String),
    /// Column wrapped in a unary modifier.
    Unary {
        modifier: UnaryModifier,
        element: Box<IndexExpression>,
    },
    /// SQL function applied to arguments.
    Function {
        name: String,
        args: Vec<IndexExpression>,
    },
}

impl IndexExpression {
    /// Parse the expression syntax used in schema documents.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PolyjuiceError::config("Index expression cannot be empty"));
        }

        // `element.modifier()`
        if let Some(head) = input.strip_suffix("()") {
            if let Some((element, method)) = head.rsplit_once('.') {
                if !element.is_empty() && is_word(method) {
                    let modifier = UnaryModifier::from_method_name(method).ok_or_else(|| {
                        PolyjuiceError::config(format!(
                            "Invalid index expression {:?}: unknown modifier '{}'",
                            input, method
                        ))
                    })?;
                    return Ok(IndexExpression::Unary {
                        modifier,
                        element: Box::new(Self::parse(element)?),
                    });
                }
            }
        }

        // `function(arg, ...)`
        if let Some(open) = input.find('(') {
            let Some(inner) = input[open + 1..].strip_suffix(')') else {
                return Err(PolyjuiceError::config(format!(
                    "Invalid index expression {:?}: unbalanced parentheses",
                    input
                )));
            };
            let args = split_arguments(inner)
                .into_iter()
                .filter(|arg| !arg.trim().is_empty())
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;
            return Ok(IndexExpression::Function {
                name: input[..open].trim().to_string(),
                args,
            });
        }

        if input.contains(')') || input.contains(',') {
            return Err(PolyjuiceError::config(format!(
                "Invalid index expression {:?}",
                input
            )));
        }

        Ok(IndexExpression::Column(input.to_string()))
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a function argument list on top-level commas.
fn split_arguments(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

impl fmt::Display for IndexExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexExpression::Column(name) => write!(f, "{}", name),
            IndexExpression::Unary { modifier, element } => {
                write!(f, "{}.{}()", element, modifier.method_name())
            }
            IndexExpression::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl TryFrom<String> for IndexExpression {
    type Error = PolyjuiceError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IndexExpression> for String {
    fn from(value: IndexExpression) -> Self {
        value.to_string()
    }
}
