use billbench_common::BenchError;
use billbench_loadgen::cli::BenchArgs;
use billbench_loadgen::config::RunConfig;
use billbench_loadgen::report::{build_report, to_pretty_json, write_json};
use billbench_loadgen::{logging, worker};
use clap::Parser;
use std::process;
use tracing::info;

#[tokio::main]
async fn main() {
    let args = BenchArgs::parse();

    let config = args.into_run_config().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(e.exit_code());
    });

    logging::init(false);

    if let Err(e) = run(&config).await {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

async fn run(config: &RunConfig) -> Result<(), BenchError> {
    let outcome = worker::execute(config).await?;
    let report = build_report(&outcome.results, outcome.wall_time);

    println!("{}", to_pretty_json(&report)?);

    if let Some(path) = &config.output_json {
        write_json(path, &report)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}
