//! Declared output shapes sent along with every generation request

use serde_json::{json, Value};

/// Schema name of per-chunk partial summaries
pub const PARTIAL_SCHEMA_NAME: &str = "partial_summary";

/// Schema name of the coherence pass output
pub const TL_DR_SCHEMA_NAME: &str = "tl_dr";

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

/// JSON Schema of a partial summary
pub fn partial_summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "authors": string_list(),
            "venue": {"type": ["string", "null"]},
            "year": {"type": ["integer", "null"]},
            "tl_dr": {"type": "string"},
            "contributions": string_list(),
            "methods": string_list(),
            "results": string_list(),
            "limitations": string_list(),
            "tags": string_list(),
            "quotes": string_list(),
            "references": string_list()
        },
        "required": ["title", "tl_dr", "contributions", "methods", "results", "limitations"]
    })
}

/// JSON Schema of the coherence pass
pub fn tl_dr_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tl_dr": {"type": "string"}
        },
        "required": ["tl_dr"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_schema_required_fields() {
        let schema = partial_summary_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(
            required,
            vec!["title", "tl_dr", "contributions", "methods", "results", "limitations"]
        );
    }

    #[test]
    fn test_tl_dr_schema() {
        assert_eq!(tl_dr_schema()["required"][0], "tl_dr");
    }
}
