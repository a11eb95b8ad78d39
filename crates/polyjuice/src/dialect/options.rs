//! Option resolution: structural column facts merged with `django` options.

use tracing::warn;

use crate::core::schema::{Column, Table};
use crate::core::value::{OptionSet, OptionValue};
use crate::error::{PolyjuiceError, Result};

use super::registry::DJANGO_DIALECT;

/// Reserved option that renames the output field.
pub const FIELD_NAME_OPTION: &str = "field_name";

/// Side-channel options with a known meaning.
pub const KNOWN_OPTIONS: &[&str] = &[
    "auto_now",
    "auto_now_add",
    "blank",
    "editable",
    "error_messages",
    FIELD_NAME_OPTION,
    "help_text",
    "on_delete",
    "related_model",
    "related_name",
    "validators",
    "verbose_name",
];

/// Resolve the option set of a column.
///
/// The result always holds `null`; it holds `default` and `unique` only when
/// the column states them, followed by every `django` side-channel option.
/// A side-channel `null` is rejected: structural nullability is the only
/// source of truth.
pub fn resolve(table: &Table, column: &Column) -> Result<OptionSet> {
    let mut options = OptionSet::new();
    options.insert("null", column.is_nullable());

    if let Some(default) = &column.default {
        options.insert("default", default.to_option_value());
    }

    if let Some(unique) = column.unique {
        options.insert("unique", unique);
    }

    for (name, value) in column.dialect_options.for_dialect(DJANGO_DIALECT) {
        if name == "null" {
            return Err(PolyjuiceError::BadNullableFieldSyntax {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
        if !KNOWN_OPTIONS.contains(&name.as_str()) {
            warn!(
                "Table {} column {}: passing unrecognized option 'django_{}' through unchanged",
                table.name, column.name, name
            );
        }
        options.insert(name.clone(), value.clone());
    }

    Ok(options)
}

/// Remove the field rename option, returning the rename if it is a non-empty string.
///
/// A rename that is not a string fails with `InvalidOptionValue`.
pub fn split_field_name(
    table: &Table,
    column: &Column,
    options: &mut OptionSet,
) -> Result<Option<String>> {
    match options.remove(FIELD_NAME_OPTION) {
        None => Ok(None),
        Some(OptionValue::Str(name)) => Ok(Some(name).filter(|n| !n.is_empty())),
        Some(other) => Err(PolyjuiceError::invalid_option(
            &table.name,
            &column.name,
            FIELD_NAME_OPTION,
            "a string",
            &other,
        )),
    }
}

/// Output field name of a column: its rename option when set, else its name.
pub fn field_name(column: &Column) -> String {
    match column.dialect_options.get(DJANGO_DIALECT, FIELD_NAME_OPTION) {
        Some(OptionValue::Str(name)) if !name.is_empty() => name.clone(),
        _ => column.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnType;

    fn test_table() -> Table {
        Table::new("test_table")
    }

    #[test]
    fn test_null_is_always_present() {
        let column = Column::new("age", ColumnType::Integer);
        let options = resolve(&test_table(), &column).unwrap();
        assert_eq!(options.get_bool("null"), Some(true));
        assert_eq!(options.len(), 1);

        let column = Column::new("age", ColumnType::Integer).nullable(false);
        let options = resolve(&test_table(), &column).unwrap();
        assert_eq!(options.get_bool("null"), Some(false));
    }

    #[test]
    fn test_unique_only_when_set() {
        let column = Column::new("id", ColumnType::Integer);
        assert!(!resolve(&test_table(), &column).unwrap().contains("unique"));

        let column = Column::new("id", ColumnType::Integer).unique(true);
        assert_eq!(
            resolve(&test_table(), &column).unwrap().get_bool("unique"),
            Some(true)
        );

        let column = Column::new("id", ColumnType::Integer).unique(false);
        assert_eq!(
            resolve(&test_table(), &column).unwrap().get_bool("unique"),
            Some(false)
        );
    }

    #[test]
    fn test_default_scalar_and_callable() {
        let column = Column::new("age", ColumnType::Integer).default_value(42);
        let options = resolve(&test_table(), &column).unwrap();
        assert_eq!(options.get("default"), Some(&OptionValue::Int(42)));

        let column = Column::new("last_updated", ColumnType::Date)
            .default_callable("datetime.date.today");
        let options = resolve(&test_table(), &column).unwrap();
        assert_eq!(
            options.get("default").and_then(OptionValue::as_callable),
            Some("datetime.date.today")
        );

        let column = Column::new("age", ColumnType::Integer);
        assert!(!resolve(&test_table(), &column).unwrap().contains("default"));
    }

    #[test]
    fn test_side_channel_options_are_merged() {
        let column = Column::new("age", ColumnType::Integer)
            .dialect_option("django", "blank", true)
            .dialect_option("django", "help_text", "Number of years since your birth day")
            .dialect_option("other", "ignored", true);
        let options = resolve(&test_table(), &column).unwrap();

        assert_eq!(options.get_bool("blank"), Some(true));
        assert_eq!(
            options.get_str("help_text"),
            Some("Number of years since your birth day")
        );
        assert!(!options.contains("ignored"));
    }

    #[test]
    fn test_side_channel_null_is_rejected() {
        let column =
            Column::new("age", ColumnType::Integer).dialect_option("django", "null", false);
        let err = resolve(&test_table(), &column).unwrap_err();
        assert!(matches!(
            err,
            PolyjuiceError::BadNullableFieldSyntax { ref table, ref column }
                if table == "test_table" && column == "age"
        ));
    }

    #[test]
    fn test_each_call_returns_fresh_set() {
        let column = Column::new("age", ColumnType::Integer);
        let mut first = resolve(&test_table(), &column).unwrap();
        first.insert("blank", true);
        let second = resolve(&test_table(), &column).unwrap();
        assert!(!second.contains("blank"));
    }

    #[test]
    fn test_split_field_name() {
        let column = Column::new("age", ColumnType::Integer)
            .dialect_option("django", "field_name", "my_age");
        let mut options = resolve(&test_table(), &column).unwrap();
        assert_eq!(
            split_field_name(&test_table(), &column, &mut options).unwrap(),
            Some("my_age".to_string())
        );
        assert!(!options.contains(FIELD_NAME_OPTION));

        let column =
            Column::new("age", ColumnType::Integer).dialect_option("django", "field_name", "");
        let mut options = resolve(&test_table(), &column).unwrap();
        assert_eq!(
            split_field_name(&test_table(), &column, &mut options).unwrap(),
            None
        );
        assert!(!options.contains(FIELD_NAME_OPTION));
        assert_eq!(field_name(&column), "age");
    }

    #[test]
    fn test_split_field_name_rejects_non_string() {
        let column =
            Column::new("age", ColumnType::Integer).dialect_option("django", "field_name", 5);
        let mut options = resolve(&test_table(), &column).unwrap();
        let err = split_field_name(&test_table(), &column, &mut options).unwrap_err();
        assert!(matches!(
            err,
            PolyjuiceError::InvalidOptionValue { ref option, ref found, ref value, .. }
                if option == "field_name" && found == "int" && value == "5"
        ));
    }
}
