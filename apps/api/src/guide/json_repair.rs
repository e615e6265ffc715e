//! JSON extraction and best-effort repair of model replies.
//!
//! Models sometimes wrap the object in prose, or emit raw newlines inside string
//! values. Extraction takes the greedy `{ ... }` span; repair escapes raw
//! newlines, carriage returns and tabs that sit inside strings and drops any
//! other raw control character there. Nothing else is fixed: an unescaped
//! quote inside a string still fails to parse.

use serde_json::Value;

/// Returns the span from the first `{` through the last `}`, if any.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Escapes raw `\n`, `\r`, `\t` inside string literals and drops the other
/// control characters below 0x20 there. Escape sequences and anything outside
/// strings are copied through unchanged.
pub fn sanitize_json_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            output.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                output.push(ch);
                escaped = true;
            }
            '"' => {
                in_string = !in_string;
                output.push(ch);
            }
            '\n' if in_string => output.push_str("\\n"),
            '\r' if in_string => output.push_str("\\r"),
            '\t' if in_string => output.push_str("\\t"),
            c if in_string && c < '\u{20}' => {}
            c => output.push(c),
        }
    }

    output
}

/// Parses `span`, falling back to the repaired string. On double failure the
/// error from the first (unrepaired) parse is returned.
pub fn parse_with_repair(span: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(span) {
        Ok(value) => Ok(value),
        Err(original) => serde_json::from_str(&sanitize_json_string(span)).map_err(|_| original),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_span_strips_surrounding_noise() {
        let text = "noise {\"a\":1,\"b\":\"x\\ny\"} noise";
        assert_eq!(extract_json_span(text), Some("{\"a\":1,\"b\":\"x\\ny\"}"));
    }

    #[test]
    fn test_extract_span_is_greedy() {
        let text = "first {\"a\":1} then {\"b\":2} end";
        assert_eq!(extract_json_span(text), Some("{\"a\":1} then {\"b\":2}"));
    }

    #[test]
    fn test_extract_span_missing_braces() {
        assert_eq!(extract_json_span("no json here"), None);
        assert_eq!(extract_json_span("} backwards {"), None);
        assert_eq!(extract_json_span("only open {"), None);
    }

    #[test]
    fn test_raw_newline_inside_string_is_repaired() {
        let text = "noise {\"a\":1,\"b\":\"x\ny\"} noise";
        let span = extract_json_span(text).unwrap();
        assert!(serde_json::from_str::<Value>(span).is_err());

        let value = parse_with_repair(span).unwrap();
        assert_eq!(value, json!({"a": 1, "b": "x\ny"}));
    }

    #[test]
    fn test_sanitize_escapes_cr_and_tab() {
        let repaired = sanitize_json_string("{\"k\":\"a\r\tb\"}");
        assert_eq!(repaired, "{\"k\":\"a\\r\\tb\"}");
    }

    #[test]
    fn test_sanitize_drops_other_control_chars_in_strings() {
        let input = "{\"overview\":\"Harbor\u{000B} at dawn\u{0007}\"}";
        assert_eq!(sanitize_json_string(input), "{\"overview\":\"Harbor at dawn\"}");

        let value = parse_with_repair(input).unwrap();
        assert_eq!(value, json!({"overview": "Harbor at dawn"}));
    }

    #[test]
    fn test_sanitize_leaves_whitespace_between_tokens() {
        let input = "{\n\t\"k\": \"v\"\n}";
        assert_eq!(sanitize_json_string(input), input);
    }

    #[test]
    fn test_sanitize_respects_escaped_quotes() {
        // The escaped quote must not toggle string state, so the newline after it
        // is still inside the string and gets escaped.
        let input = "{\"k\":\"say \\\"hi\\\"\nnow\"}";
        let value = parse_with_repair(input).unwrap();
        assert_eq!(value, json!({"k": "say \"hi\"\nnow"}));
    }

    #[test]
    fn test_sanitize_is_identity_on_valid_json() {
        let valid = r#"{"overview":"Line one\nLine two","talkingPoints":["a\tb","c"],"n":3}"#;
        let before: Value = serde_json::from_str(valid).unwrap();
        let after: Value = serde_json::from_str(&sanitize_json_string(valid)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unrepairable_returns_original_error() {
        let broken = "{\"k\": \"unterminated}";
        let original = serde_json::from_str::<Value>(broken).unwrap_err();
        let err = parse_with_repair(broken).unwrap_err();
        assert_eq!(err.to_string(), original.to_string());
    }
}
