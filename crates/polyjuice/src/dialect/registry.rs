//! Dialect registry for side-channel option namespaces.
//!
//! A column accepts prefixed keyword options (`django_on_delete`,
//! `django_help_text`, ...) only for dialects that have been registered.
//! The [`DialectRegistry`] is an explicit value that can be built and passed
//! around; [`init`] additionally installs a process-wide registry with the
//! built-in `django` dialect, once.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{PolyjuiceError, Result};

/// Name of the dialect whose options drive the Django translation.
pub const DJANGO_DIALECT: &str = "django";

static GLOBAL_REGISTRY: OnceLock<DialectRegistry> = OnceLock::new();

/// Register the built-in dialects in the process-wide registry.
///
/// Safe to call any number of times; registration happens on the first call
/// and every call returns the same registry.
pub fn init() -> &'static DialectRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        debug!("Registering built-in dialects");
        DialectRegistry::with_builtins()
    })
}

/// The process-wide registry, if [`init`] has been called.
pub fn registry() -> Option<&'static DialectRegistry> {
    GLOBAL_REGISTRY.get()
}

/// Set of dialect names accepted as side-channel option prefixes.
#[derive(Debug, Clone, Default)]
pub struct DialectRegistry {
    dialects: BTreeSet<String>,
}

impl DialectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `django` dialect registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DJANGO_DIALECT);
        registry
    }

    /// Register a dialect. Registering the same name twice is a no-op.
    ///
    /// Returns true if the dialect was newly registered.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        self.dialects.insert(name.into())
    }

    /// Check if a dialect is registered.
    pub fn has_dialect(&self, name: &str) -> bool {
        self.dialects.contains(name)
    }

    /// Split a prefixed keyword into `(dialect, option)`.
    ///
    /// The dialect is the text before the first underscore and must be
    /// registered; the option name must not be empty.
    pub fn split_kwarg<'a>(&self, key: &'a str) -> Result<(&'a str, &'a str)> {
        let unknown = |dialect: &str| PolyjuiceError::UnknownDialectOption {
            argument: key.to_string(),
            dialect: dialect.to_string(),
        };

        match key.split_once('_') {
            Some((dialect, name)) if !name.is_empty() => {
                if self.has_dialect(dialect) {
                    Ok((dialect, name))
                } else {
                    Err(unknown(dialect))
                }
            }
            Some((dialect, _)) => Err(unknown(dialect)),
            None => Err(unknown(key)),
        }
    }
}
