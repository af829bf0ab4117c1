//! Aggregate command implementation.

use crate::cli::AggregateArgs;
use crate::commands::batch::{apply_digest_overrides, digest_date};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use readlab_aggregator::{aggregate_store, AggregationReport};
use readlab_store::FsStore;

/// Execute the aggregate command.
pub fn execute_aggregate(args: AggregateArgs, config: &Config, formatter: &Formatter) -> Result<AggregationReport> {
    let date = digest_date(&args)?;
    let mut pipeline = config.pipeline.clone();
    apply_digest_overrides(&mut pipeline, &args)?;
    pipeline.validate()?;

    let store = FsStore::open(&pipeline.store_root)?;
    let report = aggregate_store(&store, &pipeline.digest_path, &pipeline.digest_options(date))?;
    println!("{}", formatter.format_aggregation(&report)?);

    Ok(report)
}
