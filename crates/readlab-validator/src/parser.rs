//! Lenient JSON extraction from free-text model output

use serde_json::Value;

/// Pull a JSON value out of model text
///
/// Tries, in order: the whole text, the first fenced code block (```json
/// or bare ```), then the first balanced `{...}` object. Returns `None`
/// when nothing parses.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            return Some(value);
        }
    }

    first_object(trimmed).and_then(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

/// Contents of the first markdown code fence
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string (e.g. "json") up to the end of the line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// First balanced `{...}` span, ignoring braces inside string literals
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_json() {
        assert_eq!(extract_json(r#" {"a": 1} "#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_json_with_markdown_wrapper() {
        let text = "Here you go:\n```json\n{\"tl_dr\": \"short\"}\n```\nThanks";
        assert_eq!(extract_json(text), Some(json!({"tl_dr": "short"})));
    }

    #[test]
    fn test_bare_fence() {
        let text = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(extract_json(text), Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let text = r#"Sure! {"title": "A {braced} title", "n": {"x": 1}} Hope this helps."#;
        assert_eq!(
            extract_json(text),
            Some(json!({"title": "A {braced} title", "n": {"x": 1}}))
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let text = r#"prefix {"q": "she said \"}\" loudly"} suffix"#;
        assert_eq!(extract_json(text), Some(json!({"q": "she said \"}\" loudly"})));
    }

    #[test]
    fn test_not_json() {
        assert_eq!(extract_json("This is not JSON"), None);
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("{ unbalanced"), None);
    }

    #[test]
    fn test_array_is_returned_as_is() {
        assert_eq!(extract_json("[1, 2]"), Some(json!([1, 2])));
    }
}
