//! Side-channel option handling.
//!
//! - [`registry`]: dialect namespaces accepted as option prefixes
//! - [`options`]: resolution of a column's structural facts and `django`
//!   options into the option set a field is built from
//!
//! # Usage
//!
//! ```rust
//! use polyjuice::core::{Column, ColumnType, Table};
//! use polyjuice::dialect;
//!
//! dialect::init();
//! let column = Column::new("age", ColumnType::Integer)
//!     .kwarg("django_help_text", "Number of years")
//!     .unwrap();
//! let options = dialect::resolve(&Table::new("people"), &column).unwrap();
//! assert_eq!(options.get_str("help_text"), Some("Number of years"));
//! ```

pub mod options;
pub mod registry;

pub use options::{field_name, resolve, split_field_name, FIELD_NAME_OPTION, KNOWN_OPTIONS};
pub use registry::{init, registry, DialectRegistry, DJANGO_DIALECT};
