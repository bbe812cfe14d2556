use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `debug`
/// or `billbench_client=debug,info`.
pub const LOG_ENV: &str = "BILLBENCH_LOG";

/// Default filter when [`LOG_ENV`] is unset.
pub fn default_directive(quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Install the global subscriber. Logs go to stderr; stdout is reserved for
/// the JSON report. Calling this twice is harmless.
pub fn init(quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
