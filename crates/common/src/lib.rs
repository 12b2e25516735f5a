//! Shared building blocks for the formgate pipeline.
//!
//! Small pure helpers with no I/O: required-fields parsing, lenient JSON
//! parsing, `${name}` template substitution, and canonical-content field
//! helpers.

pub mod fields;
pub mod json;
pub mod template;

pub use {
    fields::{field_as_string, split_fields, value_len},
    json::parse_lenient,
    template::{TemplateError, substitute},
};
