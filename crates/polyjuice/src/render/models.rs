//! `models.py` writer.

use crate::core::identifier::{quote_str, validate_identifier};
use crate::error::Result;
use crate::model::Model;
use crate::render::{
    field_call, index_call, indent, model_imports, python_literal, ModelWriter, RenderOptions,
    INDENT,
};

/// Renders models as a Django `models.py` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelsWriter;

impl ModelsWriter {
    pub fn new() -> Self {
        Self
    }

    fn render_model(&self, model: &Model) -> Result<String> {
        validate_identifier(&model.name)?;

        let mut out = format!("class {}(models.Model):\n", model.name);

        for field in &model.fields {
            validate_identifier(&field.name)?;
            out.push_str(&format!(
                "{}{} = {}\n",
                INDENT,
                field.name,
                field_call(field, "models")?
            ));
        }

        out.push('\n');
        out.push_str(&format!("{}class Meta:\n", INDENT));
        let body = INDENT.repeat(2);
        out.push_str(&format!(
            "{}db_table = {}\n",
            body,
            quote_str(&model.meta.db_table)
        ));
        if !model.meta.indexes.is_empty() {
            out.push_str(&format!("{}indexes = [\n", body));
            for index in &model.meta.indexes {
                out.push_str(&format!("{}{}{},\n", body, INDENT, index_call(index)));
            }
            out.push_str(&format!("{}]\n", body));
        }
        for (name, value) in &model.meta.options {
            validate_identifier(name)?;
            out.push_str(&format!("{}{} = {}\n", body, name, python_literal(value)?));
        }

        for method in &model.methods {
            validate_identifier(&method.name)?;
            out.push('\n');
            out.push_str(&indent(&method.source, 1));
            out.push('\n');
        }

        Ok(out)
    }
}

impl ModelWriter for ModelsWriter {
    fn name(&self) -> &'static str {
        "models"
    }

    fn file_name(&self) -> &'static str {
        "models.py"
    }

    fn render(&self, models: &[Model], options: &RenderOptions) -> Result<String> {
        let mut out = options.header();

        for module in model_imports(models) {
            out.push_str(&format!("import {}\n", module));
        }
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str("from django.db import models\n");

        for model in models {
            out.push_str("\n\n");
            out.push_str(&self.render_model(model)?);
        }

        Ok(out)
    }
}
