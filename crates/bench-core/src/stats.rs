//! Aggregated batch statistics.

use serde::{Deserialize, Serialize};

/// Percentile and summary statistics over one batch of trials.
///
/// All distribution fields are computed over the successful subset only;
/// `total_tests`, `failed_tests`, and `success_rate` account for every
/// trial in the batch. Derived once by the statistics reducer and never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean time to first token in milliseconds.
    pub mean_ttft_ms: f64,
    /// Population standard deviation of TTFT in milliseconds.
    pub std_ttft_ms: f64,
    /// Median (p50) TTFT in milliseconds.
    pub median_ttft_ms: f64,
    /// 95th percentile TTFT in milliseconds.
    pub p95_ttft_ms: f64,
    /// 99th percentile TTFT in milliseconds.
    pub p99_ttft_ms: f64,
    /// Minimum TTFT in milliseconds.
    pub min_ttft_ms: f64,
    /// Maximum TTFT in milliseconds.
    pub max_ttft_ms: f64,

    /// Mean throughput in tokens per second.
    pub mean_throughput_tps: f64,
    /// Population standard deviation of throughput.
    pub std_throughput_tps: f64,
    /// Median (p50) throughput.
    pub median_throughput_tps: f64,
    /// 95th percentile throughput.
    pub p95_throughput_tps: f64,
    /// 99th percentile throughput.
    pub p99_throughput_tps: f64,
    /// Minimum throughput.
    pub min_throughput_tps: f64,
    /// Maximum throughput.
    pub max_throughput_tps: f64,

    /// Total input tokens across successful trials.
    pub total_input_tokens: u64,
    /// Total output tokens across successful trials.
    pub total_output_tokens: u64,
    /// Number of trials in the batch, including failures.
    pub total_tests: usize,
    /// Number of failed trials.
    pub failed_tests: usize,
    /// Percentage of trials that succeeded.
    pub success_rate: f64,
}

impl Statistics {
    /// Number of successful trials behind the distribution fields.
    pub fn successful_tests(&self) -> usize {
        self.total_tests - self.failed_tests
    }
}
