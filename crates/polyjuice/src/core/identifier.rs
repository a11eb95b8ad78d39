//! Identifier validation and literal quoting for generated Python code.
//!
//! Model, field and module names end up verbatim in rendered source, so they
//! must be valid Python identifiers. String values are emitted as quoted
//! literals with the Python escape rules applied.
//!
//! # Security
//!
//! Names and values come from schema documents. Validating identifiers and
//! escaping literals keeps a schema from injecting arbitrary code into the
//! generated files.

use crate::error::{PolyjuiceError, Result};

/// Maximum identifier length accepted in generated code.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Python reserved words.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

fn invalid(name: &str, reason: impl Into<String>) -> PolyjuiceError {
    PolyjuiceError::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a Python identifier.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers exceeding the maximum length
/// - Identifiers not starting with a letter or underscore
/// - Identifiers containing anything other than letters, digits and underscores
/// - Python keywords
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "identifier cannot be empty"));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(invalid(
            name,
            format!(
                "identifier exceeds maximum length of {} bytes (got {} bytes)",
                MAX_IDENTIFIER_LENGTH,
                name.len()
            ),
        ));
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !(first.is_alphabetic() || first == '_') {
            return Err(invalid(name, "identifier must start with a letter or underscore"));
        }
    }

    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || *c == '_')) {
        return Err(invalid(name, format!("identifier contains {:?}", bad)));
    }

    if PYTHON_KEYWORDS.contains(&name) {
        return Err(invalid(name, "identifier is a Python keyword"));
    }

    Ok(())
}

/// Validate a dotted path such as `datetime.date.today` or `app.Model`.
pub fn validate_dotted_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(path, "path cannot be empty"));
    }
    for segment in path.split('.') {
        validate_identifier(segment).map_err(|_| {
            invalid(path, format!("segment {:?} is not a valid identifier", segment))
        })?;
    }
    Ok(())
}

/// Quote a string as a Python single-quoted literal.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(quote_str("it's"), "'it\\'s'");
/// ```
pub fn quote_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\x00"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
