//! Ingest command implementation.

use crate::cli::BatchArgs;
use crate::commands::batch::{build_runner, cancel_on_ctrl_c, collect_inputs, pipeline_with_concurrency};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use readlab_pipeline::BatchResult;

/// Execute the ingest command.
pub async fn execute_ingest(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<BatchResult> {
    let inputs = collect_inputs(&args.paths)?;
    let pipeline = pipeline_with_concurrency(config, args.concurrency);
    let runner = build_runner(config, pipeline, false)?;

    let result = runner.ingest(inputs, cancel_on_ctrl_c()).await;
    println!("{}", formatter.format_batch(&result)?);

    Ok(result)
}
