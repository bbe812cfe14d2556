pub mod cleanup;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod worker;
pub mod workload;
