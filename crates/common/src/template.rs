//! `${name}` string template substitution.
//!
//! Modeled as a pure function: a placeholder with no matching field is an
//! error for the caller to map, never a panic.

use {std::collections::HashMap, thiserror::Error};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no value for template placeholder `{0}`")]
    MissingField(String),

    #[error("unterminated template placeholder")]
    Unterminated,
}

/// Replace every `${name}` placeholder in `template` with `fields[name]`.
///
/// A `$` not followed by `{` passes through literally.
pub fn substitute(
    template: &str,
    fields: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed {
                return Err(TemplateError::Unterminated);
            }
            match fields.get(&name) {
                Some(value) => result.push_str(value),
                None => return Err(TemplateError::MissingField(name)),
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}
