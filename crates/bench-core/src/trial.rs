//! Per-trial measurement results.

use crate::error::BenchError;
use serde::{Deserialize, Serialize};

/// Timing and token metrics for one measured streaming invocation.
///
/// A `TrialResult` is produced by the measurement client at the end of one
/// attempt sequence, success or terminal failure, and is never mutated
/// afterwards. Failed trials carry the fault in `error_message` and
/// `http_status_code` with every numeric field zeroed, so downstream
/// aggregation needs no null handling beyond the error sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Time to first token in milliseconds.
    ///
    /// When the stream completed without any text delta this equals
    /// `total_time_ms`.
    pub ttft_ms: f64,
    /// Total wall-clock time of the successful attempt in milliseconds.
    pub total_time_ms: f64,
    /// Input token count as reported by the endpoint.
    pub input_tokens: u32,
    /// Output token count as reported by the endpoint.
    pub output_tokens: u32,
    /// Sustained generation throughput in tokens per second.
    pub tokens_per_sec: f64,
    /// Average milliseconds spent per generated token.
    pub avg_ms_per_token: f64,
    /// Full response text, retained only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// HTTP status code of the terminal attempt (200 on success).
    pub http_status_code: u16,
    /// Error description for failed trials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TrialResult {
    /// Create a failed result from a terminal fault.
    ///
    /// API faults keep their original status code and embed the
    /// machine-readable code in the message; everything else maps to 500
    /// with the fault's description.
    pub fn from_failure(error: &BenchError) -> Self {
        let (status, message) = match error {
            BenchError::Api {
                status,
                code,
                message,
            } => (*status, format!("{code}: {message}")),
            other => (500, other.to_string()),
        };

        Self {
            ttft_ms: 0.0,
            total_time_ms: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            tokens_per_sec: 0.0,
            avg_ms_per_token: 0.0,
            response_text: None,
            http_status_code: status,
            error_message: Some(message),
        }
    }

    /// Check whether this trial completed without a fault.
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    /// Time spent generating tokens after the first one, in milliseconds.
    pub fn generation_time_ms(&self) -> f64 {
        self.total_time_ms - self.ttft_ms
    }
}
