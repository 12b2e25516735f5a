//! Lenient JSON parsing for caller-supplied payloads and configured
//! templates.
//!
//! Strict JSON rejects raw control characters inside string literals, but
//! submitted form content regularly carries them (multi-line message
//! bodies pasted into a textarea). Parsing first tries strict
//! `serde_json`, then retries with control characters escaped inside
//! string literals only.

use serde_json::Value;

/// Parse `input` as JSON, tolerating raw control characters in strings.
pub fn parse_lenient(input: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(input) {
        Ok(value) => Ok(value),
        Err(strict_error) => {
            let escaped = escape_control_in_strings(input);
            // Report the original error when escaping did not help.
            serde_json::from_str(&escaped).map_err(|_| strict_error)
        },
    }
}

/// Escape raw control characters occurring inside JSON string literals.
fn escape_control_in_strings(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in input.chars() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            result.push(ch);
            continue;
        }
        if escaped {
            escaped = false;
            result.push(ch);
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                result.push(ch);
            },
            '"' => {
                in_string = false;
                result.push(ch);
            },
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            },
            c => result.push(c),
        }
    }

    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn strict_json_parses() {
        assert_eq!(parse_lenient(r#"{"k": 1}"#).unwrap(), json!({"k": 1}));
    }

    #[test]
    fn control_characters_in_strings_are_tolerated() {
        let input = "{\"message\": \"line one\nline two\ttabbed\"}";
        let value = parse_lenient(input).unwrap();
        assert_eq!(value["message"], "line one\nline two\ttabbed");
    }

    #[test]
    fn escapes_do_not_double_up() {
        let input = r#"{"message": "already\nescaped"}"#;
        let value = parse_lenient(input).unwrap();
        assert_eq!(value["message"], "already\nescaped");
    }

    #[test]
    fn invalid_json_still_fails() {
        assert!(parse_lenient("{not json").is_err());
        assert!(parse_lenient("").is_err());
    }

    #[test]
    fn control_characters_outside_strings_still_fail() {
        assert!(parse_lenient("{\u{1}\"k\": 1}").is_err());
    }
}
