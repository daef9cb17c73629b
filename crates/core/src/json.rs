//! Lenient JSON extraction for model output.
//!
//! LLMs asked for "JSON only" still routinely wrap the object in prose,
//! markdown fences, or apologies. The router and the tech agent both parse
//! responses through this one utility: find the first balanced `{...}`
//! span, parse it, and let each caller apply its own field-level defaults.

use tracing::trace;

/// Extract the first balanced `{...}` object from free text.
///
/// Walks the input tracking brace depth, skipping braces inside string
/// literals (including escaped quotes). Returns `None` when no opening
/// brace exists or the braces never balance.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and parse the first balanced object, or `None` if either
/// step fails.
pub fn parse_object(text: &str) -> Option<serde_json::Value> {
    let span = extract_object(text)?;
    match serde_json::from_str(span) {
        Ok(value) => Some(value),
        Err(e) => {
            trace!(error = %e, "Extracted brace span is not valid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_object() {
        let text = r#"{"route":"TECH","why":"API question"}"#;
        assert_eq!(extract_object(text), Some(text));
    }

    #[test]
    fn strips_surrounding_prose() {
        let text = r#"Sure! Here is the classification: {"route":"BILLING","why":"refund"} Hope that helps."#;
        assert_eq!(
            extract_object(text),
            Some(r#"{"route":"BILLING","why":"refund"}"#)
        );
    }

    #[test]
    fn handles_nested_objects() {
        let text = r#"prefix {"a":{"b":1},"c":2} suffix"#;
        assert_eq!(extract_object(text), Some(r#"{"a":{"b":1},"c":2}"#));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"answer":"use {braces} like this","ok":true}"#;
        assert_eq!(extract_object(text), Some(text));
    }

    #[test]
    fn handles_escaped_quotes_inside_strings() {
        let text = r#"{"answer":"she said \"hi {there}\"","ok":true}"#;
        assert_eq!(extract_object(text), Some(text));
    }

    #[test]
    fn unbalanced_returns_none() {
        assert_eq!(extract_object(r#"{"route":"TECH""#), None);
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_object("no json here"), None);
        assert_eq!(extract_object(""), None);
    }

    #[test]
    fn parse_object_applies_both_steps() {
        let value = parse_object(r#"noise {"route":"TECH"} noise"#).unwrap();
        assert_eq!(value["route"], "TECH");
        assert!(parse_object("{not json}").is_none());
    }
}
