use billbench_common::BenchError;
use billbench_loadgen::cleanup::{connect_and_cleanup, CleanupReport};
use billbench_loadgen::cli::{PostArgs, PostSettings};
use billbench_loadgen::report::{build_report, created_ids, to_pretty_json, write_json, PostReport};
use billbench_loadgen::workload::{encode_payloads, generate_batch};
use billbench_loadgen::{logging, worker};
use clap::Parser;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[tokio::main]
async fn main() {
    let args = PostArgs::parse();

    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let settings = args.validate(unix_secs).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(e.exit_code());
    });

    logging::init(settings.quiet);

    if let Err(e) = run(&settings).await {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

async fn run(settings: &PostSettings) -> Result<(), BenchError> {
    let issued_at = chrono::Local::now().date_naive();
    let batch = generate_batch(
        &settings.prefix,
        settings.total_requests,
        settings.min_lines,
        settings.max_lines,
        issued_at,
        settings.seed,
    );
    let config = settings.run_config(encode_payloads(&batch.payloads)?)?;
    info!(prefix = %settings.prefix, bills = batch.payloads.len(), "payloads generated");

    let outcome = worker::execute(&config).await?;
    let report = build_report(&outcome.results, outcome.wall_time);
    let ids = created_ids(&outcome.results);

    let cleanup = if settings.skip_cleanup {
        CleanupReport::skipped()
    } else {
        connect_and_cleanup(&settings.db, &settings.prefix).await
    };

    let report = PostReport::new(
        settings.target(),
        settings.run_parameters(batch.lines_per_bill),
        report,
        ids,
        cleanup,
    );

    println!("{}", to_pretty_json(&report)?);

    if let Some(path) = &config.output_json {
        write_json(path, &report)?;
        info!(path = %path.display(), "report written");
    }

    if !settings.quiet {
        eprintln!("{}", report.summary_line());
    }
    Ok(())
}
