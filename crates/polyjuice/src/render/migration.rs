//! Initial migration writer.
//!
//! Emits one `CreateModel` operation per model. Models are ordered so that a
//! model comes after the models of the same app it references; foreign keys
//! to other apps become migration dependencies on those apps.

use std::collections::BTreeSet;

use tracing::warn;

use crate::core::identifier::{quote_str, validate_identifier};
use crate::error::Result;
use crate::model::Model;
use crate::render::{
    field_call, index_call, model_imports, python_literal, ModelWriter, RenderOptions, INDENT,
};

const DELETION_MODULE: &str = "django.db.models.deletion";

/// Renders models as an initial Django migration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationWriter;

impl MigrationWriter {
    pub fn new() -> Self {
        Self
    }

    fn render_operation(&self, model: &Model) -> Result<String> {
        validate_identifier(&model.name)?;

        let i2 = INDENT.repeat(2);
        let i3 = INDENT.repeat(3);
        let i4 = INDENT.repeat(4);

        let mut out = format!("{}migrations.CreateModel(\n", i2);
        out.push_str(&format!("{}name={},\n", i3, quote_str(&model.name)));
        out.push_str(&format!("{}fields=[\n", i3));
        for field in &model.fields {
            validate_identifier(&field.name)?;
            out.push_str(&format!(
                "{}({}, {}),\n",
                i4,
                quote_str(&field.name),
                field_call(field, DELETION_MODULE)?
            ));
        }
        out.push_str(&format!("{}],\n", i3));

        out.push_str(&format!("{}options={{\n", i3));
        out.push_str(&format!(
            "{}'db_table': {},\n",
            i4,
            quote_str(&model.meta.db_table)
        ));
        if !model.meta.indexes.is_empty() {
            let indexes: Vec<String> = model.meta.indexes.iter().map(index_call).collect();
            out.push_str(&format!("{}'indexes': [{}],\n", i4, indexes.join(", ")));
        }
        for (name, value) in &model.meta.options {
            out.push_str(&format!(
                "{}{}: {},\n",
                i4,
                quote_str(name),
                python_literal(value)?
            ));
        }
        out.push_str(&format!("{}}},\n", i3));
        out.push_str(&format!("{}),\n", i2));

        Ok(out)
    }
}

impl ModelWriter for MigrationWriter {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn file_name(&self) -> &'static str {
        "0001_initial.py"
    }

    fn render(&self, models: &[Model], options: &RenderOptions) -> Result<String> {
        let mut out = options.header();

        let mut imports = model_imports(models);
        if models
            .iter()
            .any(|m| m.fields.iter().any(|f| f.field.foreign_key().is_some()))
        {
            imports.insert(DELETION_MODULE.to_string());
        }
        out.push_str("from django.db import migrations, models\n");
        for module in &imports {
            out.push_str(&format!("import {}\n", module));
        }

        out.push_str("\n\nclass Migration(migrations.Migration):\n\n");
        out.push_str(&format!("{}initial = True\n\n", INDENT));

        let dependencies = dependencies(models, &options.app_label);
        if dependencies.is_empty() {
            out.push_str(&format!("{}dependencies = []\n\n", INDENT));
        } else {
            out.push_str(&format!("{}dependencies = [\n", INDENT));
            for app in &dependencies {
                out.push_str(&format!(
                    "{}({}, '__first__'),\n",
                    INDENT.repeat(2),
                    quote_str(app)
                ));
            }
            out.push_str(&format!("{}]\n\n", INDENT));
        }

        out.push_str(&format!("{}operations = [\n", INDENT));
        for model in creation_order(models, &options.app_label) {
            out.push_str(&self.render_operation(model)?);
        }
        out.push_str(&format!("{}]\n", INDENT));

        Ok(out)
    }
}

/// Apps other than `app_label` that the models reference.
fn dependencies(models: &[Model], app_label: &str) -> BTreeSet<String> {
    models
        .iter()
        .flat_map(|m| m.fields.iter())
        .filter_map(|f| f.field.foreign_key())
        .filter_map(|fk| fk.app_label())
        .filter(|app| *app != app_label)
        .map(str::to_string)
        .collect()
}

/// Same-app model names a model references, lowercased.
fn local_targets(model: &Model, app_label: &str) -> Vec<String> {
    model
        .fields
        .iter()
        .filter_map(|f| f.field.foreign_key())
        .filter_map(|fk| match fk.to.rsplit_once('.') {
            Some((app, name)) if app == app_label => Some(name.to_lowercase()),
            Some(_) => None,
            None => Some(fk.to.to_lowercase()),
        })
        .filter(|target| *target != model.name.to_lowercase())
        .collect()
}

/// Order models so that referenced models of the same app come first.
///
/// Falls back to document order for models caught in a reference cycle.
fn creation_order<'a>(models: &'a [Model], app_label: &str) -> Vec<&'a Model> {
    let known: BTreeSet<String> = models.iter().map(|m| m.name.to_lowercase()).collect();
    let mut created: BTreeSet<String> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(models.len());
    let mut pending: Vec<&Model> = models.iter().collect();

    while !pending.is_empty() {
        let ready = pending.iter().position(|m| {
            local_targets(m, app_label)
                .iter()
                .all(|t| created.contains(t) || !known.contains(t))
        });
        let next = match ready {
            Some(pos) => pending.remove(pos),
            None => {
                let model = pending.remove(0);
                warn!(
                    "Model {} is part of a reference cycle; creating it in document order",
                    model.name
                );
                model
            }
        };
        created.insert(next.name.to_lowercase());
        ordered.push(next);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, Index, Table};
    use crate::model::{model, ModelPlaceholder};

    fn wizard() -> Model {
        let table = Table::new("hogwarts__wizard")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(
                Column::new("house_id", ColumnType::Integer)
                    .foreign_key("hogwarts__house.id")
                    .unwrap()
                    .dialect_option("django", "on_delete", "CASCADE")
                    .dialect_option("django", "field_name", "house"),
            )
            .column(
                Column::new("user_id", ColumnType::Integer)
                    .foreign_key("auth__user.id")
                    .unwrap()
                    .dialect_option("django", "on_delete", "SET_NULL")
                    .dialect_option("django", "field_name", "user"),
            );
        model(&ModelPlaceholder::new("Wizard").table(table)).unwrap()
    }

    fn house() -> Model {
        let table = Table::new("hogwarts__house")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::string(30)).nullable(false))
            .index(Index::new("ix_house_name").column("name"));
        model(&ModelPlaceholder::new("House").table(table)).unwrap()
    }

    #[test]
    fn test_dependencies() {
        let deps = dependencies(&[wizard(), house()], "hogwarts");
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["auth"]);
    }

    #[test]
    fn test_creation_order() {
        let models = [wizard(), house()];
        let names: Vec<&str> = creation_order(&models, "hogwarts")
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["House", "Wizard"]);
    }

    #[test]
    fn test_render_migration() {
        let source = MigrationWriter::new()
            .render(&[house()], &RenderOptions::new("hogwarts"))
            .unwrap();

        let expected = "\
from django.db import migrations, models


class Migration(migrations.Migration):

    initial = True

    dependencies = []

    operations = [
        migrations.CreateModel(
            name='House',
            fields=[
                ('id', models.AutoField(auto_created=True, primary_key=True, serialize=False, verbose_name='ID')),
                ('name', models.CharField(max_length=30, null=False)),
            ],
            options={
                'db_table': 'hogwarts__house',
                'indexes': [models.Index(fields=['name'], name='ix_house_name')],
            },
        ),
    ]
";
        assert_eq!(source, expected);
    }

    #[test]
    fn test_render_migration_imports_callable_modules() {
        let table = Table::new("hogwarts__owl")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(
                Column::new("code", ColumnType::string(8))
                    .default_callable("hogwarts.utils.make_code"),
            )
            .column(Column::new("hatched", ColumnType::Date).default_callable("datetime.date.today"));
        let owl = model(&ModelPlaceholder::new("Owl").table(table)).unwrap();
        let source = MigrationWriter::new()
            .render(&[owl], &RenderOptions::new("hogwarts"))
            .unwrap();

        assert!(source.starts_with(
            "from django.db import migrations, models\nimport datetime\nimport hogwarts.utils\n"
        ));
        assert!(source.contains("default=hogwarts.utils.make_code"));
        assert!(source.contains("default=datetime.date.today"));
    }

    #[test]
    fn test_render_migration_with_foreign_keys() {
        let source = MigrationWriter::new()
            .render(&[wizard(), house()], &RenderOptions::new("hogwarts"))
            .unwrap();

        assert!(source.contains("import django.db.models.deletion\n"));
        assert!(source.contains("        ('auth', '__first__'),\n"));
        assert!(source.contains(
            "('house', models.ForeignKey('hogwarts.house', on_delete=django.db.models.deletion.CASCADE, null=True)),"
        ));
        let house_pos = source.find("name='House'").unwrap();
        let wizard_pos = source.find("name='Wizard'").unwrap();
        assert!(house_pos < wizard_pos);
    }
}
