//! The measured streaming invocation client.

use crate::retry::RetryConfig;
use bench_core::{BenchError, StreamEvent, StreamRequest, StreamingEndpoint, TokenUsage, TrialResult};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Nucleus sampling parameter sent with every invocation.
const DEFAULT_TOP_P: f32 = 0.9;

/// Parameters for one measured invocation.
#[derive(Debug, Clone)]
pub struct InvokeParams {
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// User prompt, possibly carrying a large synthetic context.
    pub user_prompt: String,
    /// Maximum output tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Whether to accumulate the full response text.
    ///
    /// Disabled for batch runs to bound memory across many trials over
    /// large contexts.
    pub retain_response: bool,
}

impl InvokeParams {
    /// Create params for the given user prompt with default settings.
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_prompt: user_prompt.into(),
            max_tokens: 2048,
            temperature: 0.7,
            retain_response: false,
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the maximum output tokens.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set whether the full response text is retained.
    #[must_use]
    pub fn retain_response(mut self, retain: bool) -> Self {
        self.retain_response = retain;
        self
    }
}

/// Streaming invocation client that measures TTFT and throughput under an
/// application-level retry policy.
///
/// `invoke` never fails: every remote or transport fault is encoded in the
/// returned [`TrialResult`], so batch orchestration always collects exactly
/// one result per trial.
pub struct MeasuredClient {
    endpoint: Arc<dyn StreamingEndpoint>,
    endpoint_id: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for MeasuredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasuredClient")
            .field("endpoint_id", &self.endpoint_id)
            .field("retry", &self.retry)
            .finish()
    }
}

impl MeasuredClient {
    /// Create a client for one model endpoint with an explicit retry policy.
    pub fn new(
        endpoint: Arc<dyn StreamingEndpoint>,
        endpoint_id: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            endpoint,
            endpoint_id: endpoint_id.into(),
            retry,
        }
    }

    /// The model endpoint identifier this client invokes.
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    /// Perform one measured streaming invocation.
    ///
    /// Up to `retry.max_attempts` attempts; each attempt starts a fresh
    /// monotonic timer, so a failed attempt's elapsed time is discarded and
    /// backoff sleeps are never charged to the returned timings. Every body
    /// path of the loop returns or continues, so the call always resolves
    /// within the attempt ceiling.
    pub async fn invoke(&self, params: &InvokeParams) -> TrialResult {
        let request = StreamRequest {
            endpoint_id: self.endpoint_id.clone(),
            system: params.system_prompt.clone(),
            user: params.user_prompt.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: DEFAULT_TOP_P,
        };

        let mut attempt: u32 = 0;
        loop {
            match self.run_attempt(&request, params.retain_response).await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(attempt = attempt + 1, "attempt succeeded after retries");
                    }
                    return result;
                }
                Err(error) => {
                    if error.is_retryable() && attempt + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.retry.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "retrying after recoverable fault"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        warn!(
                            attempt = attempt + 1,
                            error = %error,
                            "invocation failed terminally"
                        );
                        return TrialResult::from_failure(&error);
                    }
                }
            }
        }
    }

    /// One timed attempt: open the stream, consume every chunk, derive
    /// metrics. The stream is dropped on every exit path, including the
    /// early returns on fault, which closes the underlying connection.
    async fn run_attempt(
        &self,
        request: &StreamRequest,
        retain_response: bool,
    ) -> Result<TrialResult, BenchError> {
        let started = Instant::now();

        let mut stream = self.endpoint.open(request).await?;

        let mut ttft_ms: Option<f64> = None;
        let mut response_text = String::new();
        let mut usage = TokenUsage::default();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Delta { text } => {
                    if ttft_ms.is_none() {
                        let elapsed = elapsed_ms(started);
                        debug!(ttft_ms = elapsed, "first token received");
                        ttft_ms = Some(elapsed);
                    }
                    if retain_response {
                        response_text.push_str(&text);
                    }
                }
                StreamEvent::Metadata { usage: reported } => {
                    usage = reported;
                }
            }
        }
        drop(stream);

        let total_time_ms = elapsed_ms(started);
        // A stream that never produced a delta degrades to TTFT == total.
        let ttft_ms = ttft_ms.unwrap_or(total_time_ms);
        let generation_time_ms = total_time_ms - ttft_ms;

        let tokens_per_sec = if generation_time_ms > 0.0 {
            f64::from(usage.output_tokens) / (generation_time_ms / 1000.0)
        } else {
            0.0
        };
        let avg_ms_per_token = if usage.output_tokens > 0 {
            generation_time_ms / f64::from(usage.output_tokens)
        } else {
            0.0
        };

        debug!(
            total_time_ms,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            tokens_per_sec,
            "stream complete"
        );

        Ok(TrialResult {
            ttft_ms,
            total_time_ms,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            tokens_per_sec,
            avg_ms_per_token,
            response_text: retain_response.then_some(response_text),
            http_status_code: 200,
            error_message: None,
        })
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
