//! Classification of generation responses

use crate::{extract_json, ValidationConfig};
use readlab_domain::{Chunk, GenerationResponse, PartialSummary, Summary};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Result of validating one generation response
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T> {
    /// The response conforms
    Valid(T),

    /// Recoverable: retry with a stricter prompt
    Malformed(Vec<RejectionReason>),

    /// The response can never be turned into a summary
    Unrecoverable(String),
}

impl<T> ValidationOutcome<T> {
    /// Whether the outcome is `Valid`
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// Why a response was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// No JSON could be extracted from the text
    InvalidJson(String),

    /// The JSON value is not an object
    NotAnObject,

    /// A required field is absent
    MissingField(String),

    /// A field has the wrong JSON type
    WrongType {
        /// Field name
        field: String,
        /// Expected type
        expected: &'static str,
    },

    /// A field that must carry text is blank
    EmptyField(String),

    /// A list that must hold unique entries repeats one
    Duplicate {
        /// Field name
        field: String,
        /// The repeated entry
        value: String,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
            RejectionReason::NotAnObject => write!(f, "expected a JSON object"),
            RejectionReason::MissingField(field) => write!(f, "missing field '{}'", field),
            RejectionReason::WrongType { field, expected } => {
                write!(f, "field '{}' must be {}", field, expected)
            }
            RejectionReason::EmptyField(field) => write!(f, "field '{}' is empty", field),
            RejectionReason::Duplicate { field, value } => {
                write!(f, "field '{}' repeats '{}'", field, value)
            }
        }
    }
}

/// Applies the declared output shapes to generation responses
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator with the given bounds
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// The bounds in use
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a per-chunk response against the partial-summary shape
    ///
    /// Quotes that are not literal substrings of `chunk.text` are dropped.
    pub fn validate_partial(
        &self,
        response: &GenerationResponse,
        chunk: &Chunk,
        strict: bool,
    ) -> ValidationOutcome<PartialSummary> {
        let obj = match self.object_of(response, strict) {
            Ok(obj) => obj,
            Err(outcome) => return outcome,
        };

        let mut reasons = Vec::new();

        let title = optional_string(&obj, "title", true, &mut reasons);
        let tl_dr = required_string(&obj, "tl_dr", &mut reasons);
        let contributions = string_list(&obj, "contributions", true, &mut reasons);
        let methods = string_list(&obj, "methods", true, &mut reasons);
        let results = string_list(&obj, "results", true, &mut reasons);
        let limitations = string_list(&obj, "limitations", true, &mut reasons);
        let authors = string_list(&obj, "authors", false, &mut reasons);
        let venue = optional_string(&obj, "venue", false, &mut reasons);
        let year = year_field(&obj, &mut reasons);
        let tags = string_list(&obj, "tags", false, &mut reasons);
        let references = string_list(&obj, "references", false, &mut reasons);
        let quotes = quote_list(&obj, &mut reasons);

        if self.config.require_nonempty_tl_dr && reasons.is_empty() && tl_dr.trim().is_empty() {
            reasons.push(RejectionReason::EmptyField("tl_dr".to_string()));
        }

        if !reasons.is_empty() {
            return ValidationOutcome::Malformed(reasons);
        }

        ValidationOutcome::Valid(PartialSummary {
            chunk_index: chunk.index,
            title: title.filter(|t| !t.is_empty()),
            authors,
            venue: venue.filter(|v| !v.is_empty()),
            year,
            tl_dr: tl_dr.trim().to_string(),
            contributions,
            methods,
            results,
            limitations,
            tags: self.bound_tags(tags),
            quotes: self.verify_quotes(quotes, chunk),
            references,
        })
    }

    /// Validate a coherence-pass response against the tl_dr shape
    pub fn validate_tl_dr(&self, response: &GenerationResponse, strict: bool) -> ValidationOutcome<String> {
        let obj = match self.object_of(response, strict) {
            Ok(obj) => obj,
            Err(outcome) => return outcome,
        };

        let mut reasons = Vec::new();
        let tl_dr = required_string(&obj, "tl_dr", &mut reasons);
        if reasons.is_empty() && tl_dr.trim().is_empty() {
            reasons.push(RejectionReason::EmptyField("tl_dr".to_string()));
        }

        if reasons.is_empty() {
            ValidationOutcome::Valid(tl_dr.trim().to_string())
        } else {
            ValidationOutcome::Malformed(reasons)
        }
    }

    /// Final conformance check of a reduced summary
    pub fn validate_summary(&self, summary: &Summary) -> Result<(), Vec<RejectionReason>> {
        let mut reasons = Vec::new();

        if summary.source_path.trim().is_empty() {
            reasons.push(RejectionReason::EmptyField("source_path".to_string()));
        }
        if summary.title.trim().is_empty() {
            reasons.push(RejectionReason::EmptyField("title".to_string()));
        }
        if self.config.require_nonempty_tl_dr && summary.tl_dr.trim().is_empty() {
            reasons.push(RejectionReason::EmptyField("tl_dr".to_string()));
        }

        let mut seen = Vec::new();
        for tag in &summary.tags {
            let key = tag.trim().to_lowercase();
            if key.is_empty() {
                reasons.push(RejectionReason::EmptyField("tags".to_string()));
                break;
            }
            if seen.contains(&key) {
                reasons.push(RejectionReason::Duplicate {
                    field: "tags".to_string(),
                    value: tag.clone(),
                });
                break;
            }
            seen.push(key);
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }

    fn object_of<T>(&self, response: &GenerationResponse, strict: bool) -> Result<Map<String, Value>, ValidationOutcome<T>> {
        let value = match response {
            GenerationResponse::Refused(reason) => {
                return Err(ValidationOutcome::Unrecoverable(format!("model refused: {}", reason)));
            }
            GenerationResponse::Structured(value) => value.clone(),
            GenerationResponse::Raw(text) => match extract_json(text) {
                Some(value) => value,
                None => {
                    return Err(ValidationOutcome::Malformed(vec![RejectionReason::InvalidJson(
                        preview(text),
                    )]));
                }
            },
        };

        match value {
            Value::Object(obj) => Ok(obj),
            _ if strict => Err(ValidationOutcome::Unrecoverable(
                "response is not a JSON object after a strict retry".to_string(),
            )),
            _ => Err(ValidationOutcome::Malformed(vec![RejectionReason::NotAnObject])),
        }
    }

    /// Case-insensitive dedupe, then truncate to `max_tags`
    fn bound_tags(&self, tags: Vec<String>) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut kept = Vec::new();
        for tag in tags {
            let key = tag.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                kept.push(tag);
            }
        }
        kept.truncate(self.config.max_tags);
        kept
    }

    /// Keep quotes that occur literally in the chunk and respect the bounds
    fn verify_quotes(&self, quotes: Vec<String>, chunk: &Chunk) -> Vec<String> {
        let mut kept = Vec::new();
        for quote in quotes {
            if kept.len() >= self.config.max_quotes {
                break;
            }
            let words = quote.split_whitespace().count();
            if words > self.config.max_quote_words {
                debug!(chunk = chunk.index, words, "Dropping over-long quote");
                continue;
            }
            if !chunk.text.contains(quote.as_str()) {
                debug!(chunk = chunk.index, quote = %quote, "Dropping quote not found in chunk text");
                continue;
            }
            kept.push(quote);
        }
        kept
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push_str("...");
    }
    out
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn required_string(obj: &Map<String, Value>, field: &str, reasons: &mut Vec<RejectionReason>) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            reasons.push(RejectionReason::WrongType {
                field: field.to_string(),
                expected: "a string",
            });
            String::new()
        }
        None => {
            reasons.push(RejectionReason::MissingField(field.to_string()));
            String::new()
        }
    }
}

/// A string field that may be null; `required` only demands presence
fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
    required: bool,
    reasons: &mut Vec<RejectionReason>,
) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Null) => None,
        Some(_) => {
            reasons.push(RejectionReason::WrongType {
                field: field.to_string(),
                expected: "a string",
            });
            None
        }
        None => {
            if required {
                reasons.push(RejectionReason::MissingField(field.to_string()));
            }
            None
        }
    }
}

/// A list of strings; blank entries are dropped
fn string_list(
    obj: &Map<String, Value>,
    field: &str,
    required: bool,
    reasons: &mut Vec<RejectionReason>,
) -> Vec<String> {
    let wrong_type = || RejectionReason::WrongType {
        field: field.to_string(),
        expected: "a list of strings",
    };

    match obj.get(field) {
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                    Value::String(_) => {}
                    _ => {
                        reasons.push(wrong_type());
                        return Vec::new();
                    }
                }
            }
            out
        }
        Some(Value::Null) if !required => Vec::new(),
        Some(_) => {
            reasons.push(wrong_type());
            Vec::new()
        }
        None => {
            if required {
                reasons.push(RejectionReason::MissingField(field.to_string()));
            }
            Vec::new()
        }
    }
}

/// Integer, numeric string, or null
fn year_field(obj: &Map<String, Value>, reasons: &mut Vec<RejectionReason>) -> Option<i32> {
    match obj.get("year") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
        Some(_) => {
            reasons.push(RejectionReason::WrongType {
                field: "year".to_string(),
                expected: "an integer",
            });
            None
        }
    }
}

/// Quotes as strings or `{text, span}` objects
fn quote_list(obj: &Map<String, Value>, reasons: &mut Vec<RejectionReason>) -> Vec<String> {
    let items = match obj.get("quotes") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            reasons.push(RejectionReason::WrongType {
                field: "quotes".to_string(),
                expected: "a list of quotes",
            });
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for item in items {
        let text = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(q) => q.get("text").and_then(Value::as_str),
            _ => None,
        };
        match text {
            Some(t) if !t.trim().is_empty() => out.push(collapse_ws(t)),
            Some(_) => {}
            None => {
                reasons.push(RejectionReason::WrongType {
                    field: "quotes".to_string(),
                    expected: "a list of quotes",
                });
                return Vec::new();
            }
        }
    }
    out
}
