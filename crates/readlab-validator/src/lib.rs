//! readlab Validator
//!
//! Enforces the declared output shape on everything the generation service
//! returns. Validation never throws: each response is classified as
//!
//! - `Valid`: parsed and conforming,
//! - `Malformed`: recoverable (bad JSON, missing or mistyped fields), worth
//!   a retry with a stricter prompt,
//! - `Unrecoverable`: the model refused or returned something that can
//!   never become a summary.
//!
//! # Examples
//!
//! ```
//! use readlab_validator::{ValidationConfig, ValidationOutcome, Validator};
//! use readlab_domain::{Chunk, GenerationResponse};
//!
//! let validator = Validator::new(ValidationConfig::default());
//! let chunk = Chunk { index: 0, start: 0, end: 11, text: "hello world".into() };
//! let response = GenerationResponse::Raw("not json".into());
//!
//! let outcome = validator.validate_partial(&response, &chunk, false);
//! assert!(matches!(outcome, ValidationOutcome::Malformed(_)));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod schema;
mod validator;

pub use config::ValidationConfig;
pub use error::ValidatorError;
pub use parser::extract_json;
pub use schema::{partial_summary_schema, tl_dr_schema, PARTIAL_SCHEMA_NAME, TL_DR_SCHEMA_NAME};
pub use validator::{RejectionReason, ValidationOutcome, Validator};
