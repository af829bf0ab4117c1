//! readlab Aggregator
//!
//! Collects persisted summaries, removes duplicates, groups them and renders
//! a Markdown digest.
//!
//! Everything here is deterministic: the same set of summaries always
//! produces the same items in the same order and a byte-identical digest,
//! whatever order they were loaded in.
//!
//! # Examples
//!
//! ```
//! use readlab_aggregator::{merge_summaries, render_digest};
//! use readlab_domain::Summary;
//!
//! let mut summary = Summary::new("papers/p1.pdf");
//! summary.title = "Attention".into();
//! summary.tl_dr = "Attention is enough.".into();
//! summary.tags = vec!["NLP".into()];
//!
//! let items = merge_summaries(vec![summary]);
//! let digest = render_digest(&items);
//! assert!(digest.contains("## NLP"));
//! ```

#![warn(missing_docs)]

mod aggregate;
mod error;
mod merge;
mod render;

pub use aggregate::{aggregate_store, AggregationReport};
pub use error::AggregatorError;
pub use merge::{merge_summaries, merge_summaries_by, DigestItem, GroupBy, DEFAULT_GROUP};
pub use render::{format_list_items, render_digest, render_digest_with, slugify, DigestOptions};
