//! Error types for the translation library.

use thiserror::Error;

use crate::core::value::OptionValue;

/// Exit code for schema document errors (invalid YAML, bad references, etc.).
pub const EXIT_CONFIG_ERROR: u8 = 1;

/// Exit code for schemas that cannot be translated to Django models.
pub const EXIT_TRANSLATION_ERROR: u8 = 2;

/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Broad classification of a [`PolyjuiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema is missing a piece of information Django requires.
    SchemaIncomplete,
    /// The schema states something that cannot be expressed in Django.
    SchemaInconsistent,
    /// The caller used the API in a way it does not allow.
    ContractViolation,
    /// The column type has no Django counterpart.
    UnmappedType,
    /// The schema document itself is invalid.
    Config,
    /// Reading or writing a file failed.
    Io,
}

/// Main error type for translation operations.
#[derive(Error, Debug)]
pub enum PolyjuiceError {
    // ===== Schema incompleteness =====
    /// The model placeholder has no table to translate.
    #[error(
        "Model `{model}`: \nA model must be given a table definition which corresponds to its table schema.\n\
         Example: ModelPlaceholder::new(\"{model}\").table(table)"
    )]
    MissingTableDefinition { model: String },

    /// String column without a length.
    #[error(
        "Table `{table}` column `{column}`: \nString column must provide a length in order to be converted to a Django CharField.\n\
         Example: Column::new(\"name\", ColumnType::String {{ length: Some(50) }})"
    )]
    MissingStringLength { table: String, column: String },

    /// Numeric column without precision or scale.
    #[error(
        "Table `{table}` column `{column}`: \nTo define a Decimal column, the arguments `precision` and `scale` must be set.\n\
         Example: Column::new(\"fees\", ColumnType::numeric(10, 5))"
    )]
    MissingDecimalFieldArgument { table: String, column: String },

    /// Foreign key column without a deletion policy.
    #[error(
        "Table `{table}` column `{column}`: \nForeignKey column must provide a 'django_on_delete' value \
         as it is mandatory for a Django ForeignKey field.\n\
         Example: Column::new(\"invented_by\", ColumnType::Integer).foreign_key(\"myrelatedmodel.id\")?.kwarg(\"django_on_delete\", \"CASCADE\")"
    )]
    MissingOnDeleteOption { table: String, column: String },

    // ===== Schema inconsistency =====
    /// Deletion policy outside the supported enumeration.
    #[error(
        "Table `{table}` column `{column}`: \nThe value `{value}` is not valid for the 'django_on_delete' option.\n\
         You must use either: CASCADE, PROTECT, SET_NULL, SET_DEFAULT or DO_NOTHING."
    )]
    InvalidOnDeleteOption {
        table: String,
        column: String,
        value: String,
    },

    /// Numeric column that explicitly disables decimal conversion.
    #[error(
        "Table `{table}` column `{column}`: \nTo define a Decimal column, the argument `asdecimal` must be kept unset or set to `true` \
         to ensure that values are handled as decimals.\n\
         Example: Column::new(\"fees\", ColumnType::numeric(10, 5))"
    )]
    InvalidDecimalFieldArgument { table: String, column: String },

    /// UUID column that does not convert to native UUID objects.
    #[error(
        "Table `{table}` column `{column}`: \nTo define a UUID column, you must enable the conversion to native uuid objects.\n\
         Example: Column::new(\"my_uuid\", ColumnType::Uuid {{ as_uuid: true }})"
    )]
    UuidColumnMissingArgument { table: String, column: String },

    /// Index expression wrapped in something other than a descending marker.
    #[error(
        "Table `{table}` index `{index}`: \nInvalid index definition.\n\
         Example: Index::new(\"some_index\").column(\"some_column\")"
    )]
    InvalidIndexDefinition { table: String, index: String },

    /// Index over a computed expression.
    #[error(
        "Table `{table}` index `{index}`: \nOnly descending index is supported yet.\n\
         Example: Index::new(\"some_index\").desc(\"some_column\")"
    )]
    UnsupportedFunctionalIndex { table: String, index: String },

    /// Side-channel option with a value of the wrong type.
    #[error(
        "Table `{table}` column `{column}`: \nThe 'django_{option}' option must be {expected}, got {found} `{value}`."
    )]
    InvalidOptionValue {
        table: String,
        column: String,
        option: String,
        expected: String,
        found: String,
        value: String,
    },

    // ===== Contract violations =====
    /// Nullability given as a side-channel option.
    #[error(
        "Table `{table}` column `{column}`: \nTo define a NULLABLE column, use the argument `nullable` instead of the `django_null` option.\n\
         Example: Column::new(\"name\", ColumnType::String {{ length: Some(50) }}).nullable(true)"
    )]
    BadNullableFieldSyntax { table: String, column: String },

    /// User meta tries to override a computed attribute.
    #[error("Table `{table}`: You cannot override Meta.{field} field.")]
    MetaOverride { table: String, field: String },

    /// User meta marks the model abstract.
    #[error("Table `{table}`: You cannot mimic an abstract model.")]
    AbstractModel { table: String },

    /// Two attributes of the output model share a name.
    #[error("Model `{model}`: attribute `{name}` is defined more than once.")]
    DuplicateAttribute { model: String, name: String },

    /// Side-channel keyword whose prefix is not a registered dialect.
    #[error(
        "Argument '{argument}' is not accepted: no dialect named '{dialect}' is registered.\n\
         Example: polyjuice::init() registers the 'django' dialect."
    )]
    UnknownDialectOption { argument: String, dialect: String },

    /// Name that cannot be used as a Python identifier in rendered code.
    #[error("Invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },

    // ===== Unmapped types =====
    /// Column type without a Django counterpart.
    #[error("Table `{table}` column `{column}`: Case not covered yet (column type `{type_name}`).")]
    UnsupportedColumnType {
        table: String,
        column: String,
        type_name: String,
    },

    // ===== Ambient =====
    /// Schema document error (invalid fields, bad references, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolyjuiceError {
    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        PolyjuiceError::Config(message.into())
    }

    /// Create an InvalidOptionValue error.
    pub fn invalid_option(
        table: impl Into<String>,
        column: impl Into<String>,
        option: impl Into<String>,
        expected: impl Into<String>,
        value: &OptionValue,
    ) -> Self {
        PolyjuiceError::InvalidOptionValue {
            table: table.into(),
            column: column.into(),
            option: option.into(),
            expected: expected.into(),
            found: value.type_name().to_string(),
            value: value.to_string(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PolyjuiceError::MissingTableDefinition { .. }
            | PolyjuiceError::MissingStringLength { .. }
            | PolyjuiceError::MissingDecimalFieldArgument { .. }
            | PolyjuiceError::MissingOnDeleteOption { .. } => ErrorKind::SchemaIncomplete,

            PolyjuiceError::InvalidOnDeleteOption { .. }
            | PolyjuiceError::InvalidDecimalFieldArgument { .. }
            | PolyjuiceError::UuidColumnMissingArgument { .. }
            | PolyjuiceError::InvalidIndexDefinition { .. }
            | PolyjuiceError::UnsupportedFunctionalIndex { .. }
            | PolyjuiceError::InvalidOptionValue { .. } => ErrorKind::SchemaInconsistent,

            PolyjuiceError::BadNullableFieldSyntax { .. }
            | PolyjuiceError::MetaOverride { .. }
            | PolyjuiceError::AbstractModel { .. }
            | PolyjuiceError::DuplicateAttribute { .. }
            | PolyjuiceError::UnknownDialectOption { .. }
            | PolyjuiceError::InvalidIdentifier { .. } => ErrorKind::ContractViolation,

            PolyjuiceError::UnsupportedColumnType { .. } => ErrorKind::UnmappedType,

            PolyjuiceError::Config(_) | PolyjuiceError::Yaml(_) | PolyjuiceError::Json(_) => {
                ErrorKind::Config
            }

            PolyjuiceError::Io(_) => ErrorKind::Io,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Config => EXIT_CONFIG_ERROR,
            ErrorKind::Io => EXIT_IO_ERROR,
            _ => EXIT_TRANSLATION_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, PolyjuiceError>;
