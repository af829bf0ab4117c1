//! readlab Quality
//!
//! Heuristic quality metrics for summaries. Nothing here blocks or fails a
//! pipeline run: the scores are for observability only.
//!
//! - [`evaluate`] scores one summary against its source text
//! - [`coverage_metrics`] describes a whole batch
//!
//! # Example
//!
//! ```
//! use readlab_domain::Summary;
//! use readlab_quality::evaluate;
//!
//! let mut summary = Summary::new("p.txt");
//! summary.title = "Sparse attention".into();
//! summary.tl_dr = "Sparse attention halves memory use.".into();
//!
//! let report = evaluate(&summary, "We show sparse attention halves memory use.");
//! assert!(report.faithfulness > 0.5);
//! ```

#![warn(missing_docs)]

mod coverage;
mod evaluate;

pub use coverage::{coverage_metrics, CoverageMetrics};
pub use evaluate::{evaluate, tokenize, QualityReport};
