//! Single-trial execution and multi-trial batch orchestration.

use crate::context::{estimate_tokens, generate_context, ContextSpec};
use crate::reduce::compute_statistics;
use bench_client::{InvokeParams, MeasuredClient};
use bench_core::{BenchError, Statistics, TrialResult};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Instruction appended after the synthetic corpus so the model has real
/// work to do over the full context.
const BATCH_INSTRUCTION: &str =
    "Summarize the key operational risks described in the documents above.";

/// Configuration for one benchmark batch at a single context size.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Context size for every trial in the batch.
    pub context: ContextSpec,
    /// Number of measured trials.
    pub iterations: u32,
    /// Number of unmeasured warmup trials run first and discarded.
    pub warmup: u32,
    /// Target pacing between trial starts; the trial's own duration is
    /// credited against it.
    pub delay: Duration,
    /// Maximum output tokens per trial.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
}

impl BatchConfig {
    /// Create a batch config with default pacing and generation settings.
    pub fn new(context: ContextSpec) -> Self {
        Self {
            context,
            iterations: 5,
            warmup: 1,
            delay: Duration::from_secs(1),
            max_tokens: 2048,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

/// Everything a finished batch produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Label of the context size the batch ran at.
    pub context_label: String,
    /// Estimated token count of the generated corpus.
    pub context_tokens: usize,
    /// One result per measured trial, failures included.
    pub results: Vec<TrialResult>,
}

impl BatchOutcome {
    /// Reduce the batch to summary statistics.
    ///
    /// # Errors
    /// Returns [`BenchError::NoSuccessfulTrials`] when every trial failed.
    pub fn statistics(&self) -> Result<Statistics, BenchError> {
        compute_statistics(&self.results)
    }

    /// Number of trials that failed.
    pub fn failed_trials(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// Runs trials against one model through a measured client.
#[derive(Debug)]
pub struct TrialRunner {
    client: MeasuredClient,
}

impl TrialRunner {
    /// Create a runner around a measured client.
    pub fn new(client: MeasuredClient) -> Self {
        Self { client }
    }

    /// The model endpoint identifier trials run against.
    pub fn endpoint_id(&self) -> &str {
        self.client.endpoint_id()
    }

    /// Run one measured trial.
    pub async fn run_trial(&self, params: &InvokeParams) -> TrialResult {
        self.client.invoke(params).await
    }

    /// Run one trial, then sleep out the remainder of `delay`.
    ///
    /// The sleep is adaptive: a trial that already took longer than the
    /// target pacing is followed by no sleep at all, so slow trials never
    /// stretch the schedule further.
    pub async fn run_paced_trial(&self, params: &InvokeParams, delay: Duration) -> TrialResult {
        let started = Instant::now();
        let result = self.client.invoke(params).await;
        let remaining = delay.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            debug!(remaining_ms = remaining.as_millis() as u64, "pacing before next trial");
            tokio::time::sleep(remaining).await;
        }
        result
    }

    /// Run a full batch: generate the corpus once, run warmup trials and
    /// discard them, then collect one result per measured trial.
    ///
    /// Trials run strictly sequentially. Individual failures are encoded in
    /// their results and never abort the batch.
    pub async fn run_batch(&self, config: &BatchConfig) -> BatchOutcome {
        let corpus = generate_context(&config.context);
        let context_tokens = estimate_tokens(&corpus);

        info!(
            endpoint_id = self.client.endpoint_id(),
            context = %config.context.label,
            context_tokens,
            iterations = config.iterations,
            warmup = config.warmup,
            "starting batch"
        );

        let mut params = InvokeParams::new(format!("{corpus}\n\n{BATCH_INSTRUCTION}"))
            .max_tokens(config.max_tokens)
            .temperature(config.temperature);
        if let Some(ref system) = config.system_prompt {
            params = params.system_prompt(system.clone());
        }

        for warmup in 1..=config.warmup {
            let result = self.run_paced_trial(&params, config.delay).await;
            debug!(warmup, success = result.is_success(), "warmup trial discarded");
        }

        let mut results = Vec::with_capacity(config.iterations as usize);
        for trial in 1..=config.iterations {
            let result = if trial < config.iterations {
                self.run_paced_trial(&params, config.delay).await
            } else {
                self.run_trial(&params).await
            };

            info!(
                trial,
                iterations = config.iterations,
                success = result.is_success(),
                ttft_ms = result.ttft_ms,
                tokens_per_sec = result.tokens_per_sec,
                "trial complete"
            );
            results.push(result);
        }

        BatchOutcome {
            context_label: config.context.label.clone(),
            context_tokens,
            results,
        }
    }
}
