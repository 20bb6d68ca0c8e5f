//! Multi-trial performance benchmark command.

use anyhow::{bail, Result};
use bench_core::{BenchError, Statistics, TrialResult};
use bench_runner::{BatchConfig, ContextSpec, TrialRunner};
use clap::Args;
use serde::Serialize;
use std::time::Duration;
use tabled::Tabled;

use crate::commands::{build_client, resolve_model};
use crate::output;

/// Arguments for the perf command.
#[derive(Args, Debug)]
pub struct PerfArgs {
    /// Registered model short name
    #[arg(short, long, default_value = "deepseek")]
    pub model: String,

    /// Raw Bedrock model ID, bypassing the registry
    #[arg(long, conflicts_with = "model")]
    pub model_id: Option<String>,

    /// Context sizes to benchmark (e.g. 8K,64K,128K)
    #[arg(short, long, value_delimiter = ',', default_value = "8K")]
    pub context_sizes: Vec<String>,

    /// Measured trials per context size
    #[arg(short, long, default_value = "5")]
    pub iterations: u32,

    /// Unmeasured warmup trials per context size
    #[arg(short, long, default_value = "1")]
    pub warmup: u32,

    /// Target pacing between trial starts, in seconds
    #[arg(short, long, default_value = "1.0")]
    pub delay: f64,

    /// Maximum output tokens per trial
    #[arg(long, default_value = "2048")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(short, long, default_value = "0.7")]
    pub temperature: f32,

    /// Optional system prompt
    #[arg(short, long)]
    pub system: Option<String>,
}

/// One row of the cross-size comparison table.
#[derive(Debug, Serialize, Tabled)]
pub struct SummaryRow {
    pub context: String,
    pub trials: usize,
    pub failed: usize,
    #[tabled(display_with = "display_rate")]
    pub success_rate: f64,
    #[tabled(display_with = "display_ms")]
    pub mean_ttft_ms: f64,
    #[tabled(display_with = "display_ms")]
    pub p95_ttft_ms: f64,
    #[tabled(display_with = "display_tps")]
    pub mean_tps: f64,
}

fn display_ms(value: &f64) -> String {
    format!("{value:.1}")
}

fn display_tps(value: &f64) -> String {
    format!("{value:.1}")
}

fn display_rate(value: &f64) -> String {
    format!("{value:.0}%")
}

/// Full per-size report for JSON output.
#[derive(Debug, Serialize)]
pub struct SizeReport {
    pub context: String,
    pub context_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    pub results: Vec<TrialResult>,
}

/// Execute the perf command.
pub async fn execute(
    args: PerfArgs,
    region: &str,
    endpoint_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let model = resolve_model(&args.model, args.model_id.as_deref())?;

    // Resolve every size up front so a typo fails before any trial runs.
    let mut specs = Vec::with_capacity(args.context_sizes.len());
    for label in &args.context_sizes {
        let spec = ContextSpec::lookup(label)?;
        if model.max_context_tokens > 0 && spec.total_tokens() > u64::from(model.max_context_tokens)
        {
            output::warning(&format!(
                "context {} (~{} tokens) exceeds the {} window of {} tokens",
                spec.label,
                spec.total_tokens(),
                model.display_name,
                model.max_context_tokens
            ));
        }
        specs.push(spec);
    }

    if args.iterations == 0 {
        bail!("iterations must be at least 1");
    }

    let client = build_client(region, endpoint_url, &model.endpoint_id)?;
    let runner = TrialRunner::new(client);

    if !json {
        output::section(&format!("Performance Benchmark: {}", model.display_name));
        output::key_value("Endpoint", &model.endpoint_id);
        output::key_value("Region", region);
        output::key_value("Iterations", &args.iterations.to_string());
        output::key_value("Warmup", &args.warmup.to_string());
    }

    let mut rows: Vec<SummaryRow> = Vec::new();
    let mut reports: Vec<SizeReport> = Vec::new();

    for spec in specs {
        let mut config = BatchConfig::new(spec.clone());
        config.iterations = args.iterations;
        config.warmup = args.warmup;
        config.delay = Duration::from_secs_f64(args.delay.max(0.0));
        config.max_tokens = args.max_tokens;
        config.temperature = args.temperature;
        config.system_prompt = args.system.clone();

        if !json {
            output::section(&format!(
                "Context {} ({} documents)",
                spec.label, spec.documents
            ));
        }

        let outcome = runner.run_batch(&config).await;

        match outcome.statistics() {
            Ok(stats) => {
                if !json {
                    print_statistics(&stats);
                }
                rows.push(SummaryRow {
                    context: outcome.context_label.clone(),
                    trials: stats.total_tests,
                    failed: stats.failed_tests,
                    success_rate: stats.success_rate,
                    mean_ttft_ms: stats.mean_ttft_ms,
                    p95_ttft_ms: stats.p95_ttft_ms,
                    mean_tps: stats.mean_throughput_tps,
                });
                reports.push(SizeReport {
                    context: outcome.context_label,
                    context_tokens: outcome.context_tokens,
                    statistics: Some(stats),
                    results: outcome.results,
                });
            }
            Err(BenchError::NoSuccessfulTrials) => {
                // A dead context size is reported but never aborts the run.
                output::warning(&format!(
                    "context {}: every trial failed, no statistics",
                    outcome.context_label
                ));
                reports.push(SizeReport {
                    context: outcome.context_label,
                    context_tokens: outcome.context_tokens,
                    statistics: None,
                    results: outcome.results,
                });
            }
            Err(other) => return Err(other.into()),
        }
    }

    if json {
        output::json(&reports)?;
    } else if !rows.is_empty() {
        output::section("Summary");
        output::table(&rows);
    }

    Ok(())
}

fn print_statistics(stats: &Statistics) {
    output::key_value(
        "Success",
        &format!(
            "{}/{} ({:.0}%)",
            stats.successful_tests(),
            stats.total_tests,
            stats.success_rate
        ),
    );
    output::key_value(
        "TTFT",
        &format!(
            "mean {} | median {} | p95 {} | p99 {} | min {} | max {} | std {}",
            output::format_ms(stats.mean_ttft_ms),
            output::format_ms(stats.median_ttft_ms),
            output::format_ms(stats.p95_ttft_ms),
            output::format_ms(stats.p99_ttft_ms),
            output::format_ms(stats.min_ttft_ms),
            output::format_ms(stats.max_ttft_ms),
            output::format_ms(stats.std_ttft_ms),
        ),
    );
    output::key_value(
        "Throughput",
        &format!(
            "mean {} | median {} | p95 {} | min {} | max {}",
            output::format_tps(stats.mean_throughput_tps),
            output::format_tps(stats.median_throughput_tps),
            output::format_tps(stats.p95_throughput_tps),
            output::format_tps(stats.min_throughput_tps),
            output::format_tps(stats.max_throughput_tps),
        ),
    );
    output::key_value(
        "Tokens",
        &format!(
            "{} in / {} out",
            stats.total_input_tokens, stats.total_output_tokens
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_ms(&123.456), "123.5");
        assert_eq!(display_rate(&60.0), "60%");
        assert_eq!(display_tps(&45.67), "45.7");
    }
}
