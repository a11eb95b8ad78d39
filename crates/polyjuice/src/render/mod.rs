//! Django source rendering for assembled models.
//!
//! - [`models`]: a `models.py` module with one class per model
//! - [`migration`]: an initial migration with one `CreateModel` per model
//!
//! Both writers share the Python expression helpers of this module. Every
//! identifier is validated and every string is quoted through
//! [`crate::core::identifier`] before it reaches the output.
//!
//! # Usage
//!
//! ```rust
//! use polyjuice::core::{Column, ColumnType, Table};
//! use polyjuice::model::{model, ModelPlaceholder};
//! use polyjuice::render::{OutputFormat, RenderOptions};
//!
//! polyjuice::init();
//! let table = Table::new("wizards").column(Column::new("name", ColumnType::string(50)));
//! let wizard = model(&ModelPlaceholder::new("Wizard").table(table)).unwrap();
//!
//! let source = OutputFormat::Models
//!     .writer()
//!     .render(&[wizard], &RenderOptions::new("hogwarts"))
//!     .unwrap();
//! assert!(source.contains("name = models.CharField(max_length=50, null=True)"));
//! ```

pub mod migration;
pub mod models;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::core::identifier::{quote_str, validate_dotted_path, validate_identifier};
use crate::core::value::OptionValue;
use crate::error::Result;
use crate::model::{Model, ModelField};
use crate::translate::{FieldKind, ModelIndex};

pub use migration::MigrationWriter;
pub use models::ModelsWriter;

/// Indentation unit of generated code.
pub(crate) const INDENT: &str = "    ";

/// Settings shared by all writers.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Django app label of the rendered models.
    pub app_label: String,

    /// Generation time written in the header. No header when unset.
    pub generated_at: Option<DateTime<Utc>>,

    /// Schema fingerprint written in the header.
    pub fingerprint: Option<String>,
}

impl RenderOptions {
    /// Options without a header.
    pub fn new(app_label: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            generated_at: None,
            fingerprint: None,
        }
    }

    /// Emit a header stamped with the given time.
    pub fn with_header(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Record the schema fingerprint in the header.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Header comment lines, empty when no header is requested.
    pub(crate) fn header(&self) -> String {
        let Some(generated_at) = self.generated_at else {
            return String::new();
        };
        let mut header = format!(
            "# Generated by polyjuice {} on {}\n",
            env!("CARGO_PKG_VERSION"),
            generated_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(fingerprint) = &self.fingerprint {
            header.push_str(&format!("# Schema fingerprint: {}\n", fingerprint));
        }
        header.push('\n');
        header
    }
}

/// A writer that renders models as Django source.
pub trait ModelWriter {
    /// Writer name, as used on the command line.
    fn name(&self) -> &'static str;

    /// Conventional file name of the output.
    fn file_name(&self) -> &'static str;

    /// Render the models as one Python module.
    fn render(&self, models: &[Model], options: &RenderOptions) -> Result<String>;
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Django `models.py`.
    #[default]
    Models,
    /// Initial Django migration.
    Migration,
}

impl OutputFormat {
    /// Writer for this format.
    pub fn writer(&self) -> Box<dyn ModelWriter> {
        match self {
            OutputFormat::Models => Box::new(ModelsWriter::new()),
            OutputFormat::Migration => Box::new(MigrationWriter::new()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Models => write!(f, "models"),
            OutputFormat::Migration => write!(f, "migration"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "models" => Ok(OutputFormat::Models),
            "migration" => Ok(OutputFormat::Migration),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Render an option value as a Python expression.
pub fn python_literal(value: &OptionValue) -> Result<String> {
    Ok(match value {
        OptionValue::Null => "None".to_string(),
        OptionValue::Bool(true) => "True".to_string(),
        OptionValue::Bool(false) => "False".to_string(),
        OptionValue::Int(v) => v.to_string(),
        OptionValue::Float(v) if v.is_nan() => "float('nan')".to_string(),
        OptionValue::Float(v) if v.is_infinite() => {
            if *v > 0.0 {
                "float('inf')".to_string()
            } else {
                "float('-inf')".to_string()
            }
        }
        OptionValue::Float(v) => format!("{:?}", v),
        OptionValue::Str(v) => quote_str(v),
        OptionValue::List(items) => {
            let items = items.iter().map(python_literal).collect::<Result<Vec<_>>>()?;
            format!("[{}]", items.join(", "))
        }
        OptionValue::Map(entries) => {
            let entries = entries
                .iter()
                .map(|(k, v)| Ok(format!("{}: {}", quote_str(k), python_literal(v)?)))
                .collect::<Result<Vec<_>>>()?;
            format!("{{{}}}", entries.join(", "))
        }
        OptionValue::Callable(c) => {
            validate_dotted_path(&c.callable)?;
            c.callable.clone()
        }
    })
}

/// Standard library classes whose attributes are used as callables.
const STDLIB_CLASSES: &[&str] = &[
    "datetime.date",
    "datetime.datetime",
    "datetime.time",
    "datetime.timedelta",
    "datetime.timezone",
    "decimal.Decimal",
];

/// Module that defines a callable, e.g. `hogwarts.utils` for
/// `hogwarts.utils.make_code` and `datetime` for `datetime.date.today`.
///
/// Segments naming a class (a known standard library class or a capitalized
/// name) are not part of the module path.
pub(crate) fn callable_module(callable: &str) -> Option<&str> {
    let (mut module, _) = callable.rsplit_once('.')?;
    loop {
        let last = module.rsplit('.').next().unwrap_or(module);
        let is_class =
            STDLIB_CLASSES.contains(&module) || last.starts_with(|c: char| c.is_ascii_uppercase());
        if !is_class {
            return Some(module);
        }
        module = module.rsplit_once('.')?.0;
    }
}

/// Modules to import for the callables referenced by a value.
pub(crate) fn collect_imports(value: &OptionValue, imports: &mut BTreeSet<String>) {
    match value {
        OptionValue::Callable(c) => {
            if let Some(module) = callable_module(&c.callable) {
                imports.insert(module.to_string());
            }
        }
        OptionValue::List(items) => items.iter().for_each(|v| collect_imports(v, imports)),
        OptionValue::Map(entries) => entries.values().for_each(|v| collect_imports(v, imports)),
        _ => {}
    }
}

/// Modules imported by the field options of a set of models.
pub(crate) fn model_imports(models: &[Model]) -> BTreeSet<String> {
    let mut imports = BTreeSet::new();
    for model in models {
        for field in &model.fields {
            for (_, value) in field.field.options.iter() {
                collect_imports(value, &mut imports);
            }
        }
        for value in model.meta.options.values() {
            collect_imports(value, &mut imports);
        }
    }
    imports
}

/// Render a field constructor call, e.g. `models.CharField(max_length=50)`.
///
/// `on_delete` is the expression prefix for deletion policies
/// (`models` in `models.py`, `django.db.models.deletion` in migrations).
pub(crate) fn field_call(model_field: &ModelField, on_delete: &str) -> Result<String> {
    let field = &model_field.field;
    let mut args = Vec::new();

    match &field.kind {
        FieldKind::ForeignKey(fk) => {
            validate_dotted_path(&fk.to)?;
            args.push(quote_str(&fk.to));
            args.push(format!("on_delete={}.{}", on_delete, fk.on_delete));
            if let Some(related_name) = &fk.related_name {
                args.push(format!("related_name={}", quote_str(related_name)));
            }
        }
        FieldKind::Char { max_length } => args.push(format!("max_length={}", max_length)),
        FieldKind::Decimal {
            max_digits,
            decimal_places,
        } => {
            args.push(format!("decimal_places={}", decimal_places));
            args.push(format!("max_digits={}", max_digits));
        }
        _ => {}
    }

    if let Some(db_column) = db_column(model_field) {
        args.push(format!("db_column={}", quote_str(db_column)));
    }

    for (key, value) in field.options.iter() {
        validate_identifier(key)?;
        args.push(format!("{}={}", key, python_literal(value)?));
    }

    Ok(format!(
        "models.{}({})",
        field.kind.django_class(),
        args.join(", ")
    ))
}

/// Source column to name explicitly, when Django would derive another one.
fn db_column(model_field: &ModelField) -> Option<&str> {
    let derived = match model_field.field.kind {
        FieldKind::ForeignKey(_) => format!("{}_id", model_field.name),
        _ => model_field.name.clone(),
    };
    (derived != model_field.column).then_some(model_field.column.as_str())
}

/// Render a `models.Index(...)` expression.
pub(crate) fn index_call(index: &ModelIndex) -> String {
    let fields: Vec<String> = index.fields.iter().map(|f| quote_str(f)).collect();
    format!(
        "models.Index(fields=[{}], name={})",
        fields.join(", "),
        quote_str(&index.name)
    )
}

/// Indent every non-empty line of a block.
pub(crate) fn indent(block: &str, depth: usize) -> String {
    let prefix = INDENT.repeat(depth);
    block
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, Table};
    use crate::core::value::OptionSet;
    use crate::translate::{to_field, Field};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn model_field(column: Column) -> ModelField {
        let (name, field) = to_field(&Table::new("t"), &column).unwrap();
        ModelField {
            name,
            column: column.name.clone(),
            field,
        }
    }

    #[test]
    fn test_python_literal() {
        assert_eq!(python_literal(&OptionValue::Null).unwrap(), "None");
        assert_eq!(python_literal(&true.into()).unwrap(), "True");
        assert_eq!(python_literal(&42.into()).unwrap(), "42");
        assert_eq!(python_literal(&1.5.into()).unwrap(), "1.5");
        assert_eq!(python_literal(&2.0.into()).unwrap(), "2.0");
        assert_eq!(python_literal(&"it's".into()).unwrap(), "'it\\'s'");
        assert_eq!(
            python_literal(&vec!["-name", "id"].into()).unwrap(),
            "['-name', 'id']"
        );

        let mut map = BTreeMap::new();
        map.insert("unique".to_string(), OptionValue::from("Taken"));
        assert_eq!(
            python_literal(&map.into()).unwrap(),
            "{'unique': 'Taken'}"
        );
    }

    #[test]
    fn test_python_literal_callable() {
        let value = OptionValue::callable("datetime.date.today");
        assert_eq!(python_literal(&value).unwrap(), "datetime.date.today");

        let value = OptionValue::callable("os.system('rm')");
        assert!(python_literal(&value).is_err());
    }

    #[test]
    fn test_collect_imports() {
        let mut imports = BTreeSet::new();
        collect_imports(&OptionValue::callable("datetime.date.today"), &mut imports);
        collect_imports(&OptionValue::callable("uuid4"), &mut imports);
        collect_imports(
            &vec![OptionValue::callable("uuid.uuid4")].into(),
            &mut imports,
        );
        collect_imports(
            &OptionValue::callable("django.utils.timezone.now"),
            &mut imports,
        );
        assert_eq!(
            imports.into_iter().collect::<Vec<_>>(),
            vec!["datetime", "django.utils.timezone", "uuid"]
        );
    }

    #[test]
    fn test_callable_module() {
        assert_eq!(callable_module("myapp.utils.fn"), Some("myapp.utils"));
        assert_eq!(callable_module("uuid.uuid4"), Some("uuid"));
        assert_eq!(callable_module("datetime.date.today"), Some("datetime"));
        assert_eq!(callable_module("datetime.datetime.now"), Some("datetime"));
        assert_eq!(
            callable_module("hogwarts.codes.CodeFactory.create"),
            Some("hogwarts.codes")
        );
        assert_eq!(callable_module("make_code"), None);
        assert_eq!(callable_module("Factory.create"), None);
    }

    #[test]
    fn test_field_call() {
        let f = model_field(Column::new("name", ColumnType::string(50)).nullable(false));
        assert_eq!(
            field_call(&f, "models").unwrap(),
            "models.CharField(max_length=50, null=False)"
        );

        let f = model_field(Column::new("price", ColumnType::numeric(10, 2)));
        assert_eq!(
            field_call(&f, "models").unwrap(),
            "models.DecimalField(decimal_places=2, max_digits=10, null=True)"
        );
    }

    #[test]
    fn test_field_call_foreign_key() {
        let f = model_field(
            Column::new("house_id", ColumnType::Integer)
                .foreign_key("hogwarts__house.id")
                .unwrap()
                .dialect_option("django", "on_delete", "CASCADE")
                .dialect_option("django", "related_name", "members"),
        );
        assert_eq!(
            field_call(&f, "models").unwrap(),
            "models.ForeignKey('hogwarts.house', on_delete=models.CASCADE, \
             related_name='members', db_column='house_id', null=True)"
        );

        let f = model_field(
            Column::new("house_id", ColumnType::Integer)
                .foreign_key("house.id")
                .unwrap()
                .dialect_option("django", "on_delete", "PROTECT")
                .dialect_option("django", "field_name", "house"),
        );
        assert_eq!(
            field_call(&f, "django.db.models.deletion").unwrap(),
            "models.ForeignKey('house', on_delete=django.db.models.deletion.PROTECT, null=True)"
        );
    }

    #[test]
    fn test_field_call_rejects_bad_option_key() {
        let mut options = OptionSet::new();
        options.insert("not valid", true);
        let f = ModelField {
            name: "x".to_string(),
            column: "x".to_string(),
            field: Field::new(FieldKind::Integer, options),
        };
        assert!(field_call(&f, "models").is_err());
    }

    #[test]
    fn test_index_call() {
        let index = ModelIndex::new("ix_name", vec!["-name".to_string(), "id".to_string()]);
        assert_eq!(
            index_call(&index),
            "models.Index(fields=['-name', 'id'], name='ix_name')"
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(
            indent("def f(self):\n    return 1\n\n", 1),
            "    def f(self):\n        return 1\n"
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(RenderOptions::new("app").header(), "");

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let header = RenderOptions::new("app")
            .with_header(at)
            .with_fingerprint("abc123")
            .header();
        assert!(header.starts_with("# Generated by polyjuice "));
        assert!(header.contains("2024-05-01 12:30"));
        assert!(header.contains("# Schema fingerprint: abc123"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("models".parse::<OutputFormat>(), Ok(OutputFormat::Models));
        assert_eq!("Migration".parse::<OutputFormat>(), Ok(OutputFormat::Migration));
        assert!("sql".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Migration.writer().file_name(), "0001_initial.py");
    }
}
