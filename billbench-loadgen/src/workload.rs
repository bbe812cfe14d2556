use billbench_common::{BenchError, CreateBillLine, CreateBillRequest, Result};
use bytes::Bytes;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::metrics::round2;
use crate::worker::results_capacity;

/// Line-item concepts drawn at random for generated bills.
pub const CONCEPTS: [&str; 10] = [
    "Cloud Hosting",
    "API Requests",
    "Data Processing",
    "Consulting Hours",
    "Support Plan",
    "Storage Usage",
    "Security Monitoring",
    "Training Session",
    "Integration Fee",
    "Premium Feature",
];

pub const CURRENCY: &str = "USD";

/// Run prefix used when none is given: `BENCH-POST-<unix seconds>`.
pub fn default_prefix(unix_secs: u64) -> String {
    format!("BENCH-POST-{unix_secs}")
}

pub fn bill_number(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index:03}")
}

pub fn customer_name(prefix: &str, index: usize) -> String {
    format!("{prefix}-customer-{index:03}")
}

/// Build one bill with `line_count` random lines.
///
/// Draw order per line is quantity, unit amount, concept; the tax factor is
/// drawn last. Keeping that order fixed is what makes a seed reproducible.
pub fn generate(
    prefix: &str,
    index: usize,
    line_count: usize,
    issued_at: NaiveDate,
    rng: &mut impl Rng,
) -> CreateBillRequest {
    let mut lines = Vec::with_capacity(line_count);
    let mut subtotal = 0.0;
    for _ in 0..line_count {
        let quantity = round2(rng.gen_range(1.0..=5.0));
        let unit_amount = round2(rng.gen_range(10.0..=500.0));
        subtotal += round2(quantity * unit_amount);
        let concept = CONCEPTS.choose(rng).copied().unwrap_or(CONCEPTS[0]);
        lines.push(CreateBillLine { concept: concept.to_string(), quantity, unit_amount });
    }

    let tax = round2(subtotal * rng.gen_range(0.05..=0.12));

    CreateBillRequest {
        bill_number: bill_number(prefix, index),
        issued_at,
        customer_name: customer_name(prefix, index),
        currency: CURRENCY.to_string(),
        tax,
        lines,
    }
}

/// Every payload of a POST run, plus the line count chosen for each.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub payloads: Vec<CreateBillRequest>,
    pub lines_per_bill: Vec<usize>,
}

/// Generate `count` bills numbered from 1, each with a line count drawn from
/// `min_lines..=max_lines` out of the same seeded stream.
pub fn generate_batch(
    prefix: &str,
    count: usize,
    min_lines: usize,
    max_lines: usize,
    issued_at: NaiveDate,
    seed: u64,
) -> Batch {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut payloads = Vec::with_capacity(results_capacity(count));
    let mut lines_per_bill = Vec::with_capacity(results_capacity(count));
    for index in 1..=count {
        let line_count = rng.gen_range(min_lines..=max_lines);
        lines_per_bill.push(line_count);
        payloads.push(generate(prefix, index, line_count, issued_at, &mut rng));
    }
    Batch { payloads, lines_per_bill }
}

/// Serialize payloads up front so encoding never lands inside a measured request.
pub fn encode_payloads(payloads: &[CreateBillRequest]) -> Result<Vec<Bytes>> {
    payloads
        .iter()
        .map(|p| {
            serde_json::to_vec(p)
                .map(Bytes::from)
                .map_err(|e| BenchError::InvalidArgument(format!("cannot encode bill {}: {e}", p.bill_number)))
        })
        .collect()
}
