//! gatewatch -- SSH break-in detector for syslog archives.
//!
//! One-shot batch runner: builds the pipeline from CLI arguments,
//! runs it to completion, and prints a run summary. Logs go to stderr,
//! results go to the output files and stdout.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;

use cli::GatewatchCli;
use error::CliError;
use gatewatch_pipeline::{Pipeline, PipelineConfigBuilder, RunSummary};

#[tokio::main]
async fn main() {
    let cli = GatewatchCli::parse();

    // Structured JSON would be noisy for interactive use: compact
    // format on stderr, so stdout stays clean for the summary.
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: GatewatchCli) -> Result<(), CliError> {
    let config = PipelineConfigBuilder::new()
        .input(cli.input)
        .attempts(cli.attempts)
        .window_secs(cli.seconds)
        .parallelism(cli.parallelism)
        .year(cli.year)
        .output_dir(cli.output_dir)
        .build()?;

    let breakins_path = config.breakins_path();
    let summary = Pipeline::new(config)?.run().await?;

    print_summary(&summary);
    println!("break-ins written to {}", breakins_path.display());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} lines in {:.3}s ({:.0} lines/s)",
        summary.total_lines,
        summary.elapsed.as_secs_f64(),
        summary.total_lines as f64 / summary.elapsed.as_secs_f64().max(f64::EPSILON),
    );
    println!(
        "failures {}  successes {}  suspects {}  skipped {}",
        summary.failures, summary.successes, summary.suspects, summary.skipped,
    );
    println!("break-ins {}", summary.breakins);
}
