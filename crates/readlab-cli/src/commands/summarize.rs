//! Summarize command implementation.

use crate::cli::BatchArgs;
use crate::commands::batch::{build_runner, cancel_on_ctrl_c, collect_inputs, pipeline_with_concurrency};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use readlab_pipeline::BatchResult;
use tracing::info;

/// Execute the summarize command.
pub async fn execute_summarize(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<BatchResult> {
    let inputs = collect_inputs(&args.paths)?;
    let pipeline = pipeline_with_concurrency(config, args.concurrency);
    let runner = build_runner(config, pipeline, true)?;
    info!(
        model = %config.llm.effective_model(),
        provider = %config.llm.provider,
        documents = inputs.len(),
        "Summarizing"
    );

    let result = runner.run(inputs, cancel_on_ctrl_c()).await;
    println!("{}", formatter.format_batch(&result)?);

    Ok(result)
}
