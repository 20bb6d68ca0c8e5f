//! Statistics reduction over a batch of trial results.

use bench_core::{BenchError, Statistics, TrialResult};

/// Reduce a batch of trial results to summary statistics.
///
/// Distribution fields are computed over the successful subset only;
/// failures still count toward `total_tests`, `failed_tests`, and the
/// success rate. An all-failed batch is not representable as statistics
/// and reduces to a hard error rather than NaN-filled output.
///
/// # Errors
/// Returns [`BenchError::NoSuccessfulTrials`] when no trial succeeded.
pub fn compute_statistics(results: &[TrialResult]) -> Result<Statistics, BenchError> {
    let successes: Vec<&TrialResult> = results.iter().filter(|r| r.is_success()).collect();
    if successes.is_empty() {
        return Err(BenchError::NoSuccessfulTrials);
    }

    let ttfts = sorted(successes.iter().map(|r| r.ttft_ms));
    let throughputs = sorted(successes.iter().map(|r| r.tokens_per_sec));

    let failed_tests = results.len() - successes.len();
    Ok(Statistics {
        mean_ttft_ms: mean(&ttfts),
        std_ttft_ms: population_std(&ttfts),
        median_ttft_ms: percentile(&ttfts, 50.0),
        p95_ttft_ms: percentile(&ttfts, 95.0),
        p99_ttft_ms: percentile(&ttfts, 99.0),
        min_ttft_ms: ttfts[0],
        max_ttft_ms: ttfts[ttfts.len() - 1],

        mean_throughput_tps: mean(&throughputs),
        std_throughput_tps: population_std(&throughputs),
        median_throughput_tps: percentile(&throughputs, 50.0),
        p95_throughput_tps: percentile(&throughputs, 95.0),
        p99_throughput_tps: percentile(&throughputs, 99.0),
        min_throughput_tps: throughputs[0],
        max_throughput_tps: throughputs[throughputs.len() - 1],

        total_input_tokens: successes.iter().map(|r| u64::from(r.input_tokens)).sum(),
        total_output_tokens: successes.iter().map(|r| u64::from(r.output_tokens)).sum(),
        total_tests: results.len(),
        failed_tests,
        success_rate: 100.0 * successes.len() as f64 / results.len() as f64,
    })
}

fn sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile by linear interpolation between closest ranks.
///
/// `values` must be sorted ascending and non-empty. The rank of the p-th
/// percentile is `p/100 * (n-1)`; a fractional rank interpolates between
/// the two neighboring order statistics.
fn percentile(values: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let fraction = rank - lower as f64;
    values[lower] + fraction * (values[upper] - values[lower])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::BenchError;

    fn success(ttft_ms: f64, tokens_per_sec: f64) -> TrialResult {
        TrialResult {
            ttft_ms,
            total_time_ms: ttft_ms + 1000.0,
            input_tokens: 8000,
            output_tokens: 400,
            tokens_per_sec,
            avg_ms_per_token: 2.5,
            response_text: None,
            http_status_code: 200,
            error_message: None,
        }
    }

    fn failure(status: u16) -> TrialResult {
        TrialResult::from_failure(&BenchError::api(status, "ThrottlingException", "slow down"))
    }

    #[test]
    fn test_basic_aggregates() {
        let results = vec![
            success(100.0, 40.0),
            success(200.0, 50.0),
            success(150.0, 45.0),
        ];
        let stats = compute_statistics(&results).unwrap();

        assert!((stats.mean_ttft_ms - 150.0).abs() < f64::EPSILON);
        assert!((stats.median_ttft_ms - 150.0).abs() < f64::EPSILON);
        assert!((stats.min_ttft_ms - 100.0).abs() < f64::EPSILON);
        assert!((stats.max_ttft_ms - 200.0).abs() < f64::EPSILON);
        // Population std over {100, 150, 200}.
        assert!((stats.std_ttft_ms - 40.824_829).abs() < 1e-3);

        assert!((stats.mean_throughput_tps - 45.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_input_tokens, 24_000);
        assert_eq!(stats.total_output_tokens, 1200);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.failed_tests, 0);
        assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&values, 50.0) - 30.0).abs() < f64::EPSILON);
        // Rank 0.95 * 4 = 3.8, between 40 and 50.
        assert!((percentile(&values, 95.0) - 48.0).abs() < 1e-9);
        assert!((percentile(&values, 99.0) - 49.6).abs() < 1e-9);
        assert!((percentile(&values, 0.0) - 10.0).abs() < f64::EPSILON);
        assert!((percentile(&values, 100.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_result_degenerates_cleanly() {
        let stats = compute_statistics(&[success(120.0, 42.0)]).unwrap();

        assert_eq!(stats.std_ttft_ms, 0.0);
        assert_eq!(stats.median_ttft_ms, 120.0);
        assert_eq!(stats.p95_ttft_ms, 120.0);
        assert_eq!(stats.p99_ttft_ms, 120.0);
        assert_eq!(stats.min_ttft_ms, stats.max_ttft_ms);
        assert!(stats.std_ttft_ms.is_finite());
        assert!(stats.mean_throughput_tps.is_finite());
    }

    #[test]
    fn test_failures_excluded_from_distributions() {
        let results = vec![
            success(100.0, 40.0),
            failure(429),
            success(200.0, 50.0),
            failure(503),
        ];
        let stats = compute_statistics(&results).unwrap();

        // Failed trials carry zeroed timings and must not drag the min down.
        assert!((stats.min_ttft_ms - 100.0).abs() < f64::EPSILON);
        assert!((stats.mean_ttft_ms - 150.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_tests, 4);
        assert_eq!(stats.failed_tests, 2);
        assert_eq!(stats.successful_tests(), 2);
        assert!((stats.success_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_input_tokens, 16_000);
    }

    #[test]
    fn test_all_failed_batch_is_an_error() {
        let results = vec![failure(429), failure(500)];
        let err = compute_statistics(&results).unwrap_err();
        assert!(matches!(err, BenchError::NoSuccessfulTrials));
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        assert!(matches!(
            compute_statistics(&[]),
            Err(BenchError::NoSuccessfulTrials)
        ));
    }
}
