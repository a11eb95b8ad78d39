//! Core types shared by every stage of the translation.
//!
//! - [`schema`]: table, column and index metadata
//! - [`value`]: dynamically typed option values and option sets
//! - [`identifier`]: identifier validation and literal quoting for rendered code

pub mod identifier;
pub mod schema;
pub mod value;

pub use schema::{
    Column, ColumnDefault, ColumnType, DialectOptions, ForeignKeyRef, Index, IndexExpression,
    Table, TypeFamily, UnaryModifier,
};
pub use value::{CallableRef, OptionSet, OptionValue};
