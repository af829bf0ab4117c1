//! Run command implementation: summarize, then aggregate.

use crate::cli::RunArgs;
use crate::commands::batch::{
    apply_digest_overrides, build_runner, cancel_on_ctrl_c, collect_inputs, digest_date, pipeline_with_concurrency,
};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use readlab_pipeline::BatchResult;
use tracing::info;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<BatchResult> {
    let inputs = collect_inputs(&args.batch.paths)?;
    let date = digest_date(&args.digest)?;
    let mut pipeline = pipeline_with_concurrency(config, args.batch.concurrency);
    apply_digest_overrides(&mut pipeline, &args.digest)?;
    let runner = build_runner(config, pipeline, true)?;
    info!(
        model = %config.llm.effective_model(),
        provider = %config.llm.provider,
        documents = inputs.len(),
        "Running pipeline"
    );

    let (result, report) = runner.run_and_aggregate(inputs, cancel_on_ctrl_c(), date).await?;
    println!("{}", formatter.format_batch(&result)?);
    println!("{}", formatter.format_aggregation(&report)?);

    Ok(result)
}
