//! The streaming endpoint boundary.
//!
//! The measurement client depends on an abstract streaming capability so
//! tests can inject a scripted endpoint yielding a controlled chunk and
//! fault sequence instead of a live Bedrock connection.

use crate::error::BenchError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A single streaming invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Model endpoint identifier.
    pub endpoint_id: String,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// User prompt, possibly carrying a large synthetic context.
    pub user: String,
    /// Maximum number of output tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
}

/// Endpoint-reported token usage from the terminal metadata chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the input context.
    pub input_tokens: u32,
    /// Tokens generated in the response.
    pub output_tokens: u32,
}

/// One chunk of a streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text content delta.
    Delta {
        /// The text fragment.
        text: String,
    },
    /// Terminal usage metadata.
    Metadata {
        /// Endpoint-reported token counts.
        usage: TokenUsage,
    },
}

/// The ordered sequence of chunks produced by one streaming call.
pub type EventStream = BoxStream<'static, Result<StreamEvent, BenchError>>;

/// Capability to open one streaming inference call.
///
/// Implementations must not perform their own retries; the retry policy
/// lives in the measurement client so backoff can never pollute timing.
#[async_trait]
pub trait StreamingEndpoint: Send + Sync {
    /// Open a streaming call and return the chunk sequence.
    ///
    /// # Errors
    /// Transport and HTTP-level failures surface here; mid-stream faults
    /// surface as `Err` items of the returned stream.
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, BenchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct SingleChunkEndpoint;

    #[async_trait]
    impl StreamingEndpoint for SingleChunkEndpoint {
        async fn open(&self, _request: &StreamRequest) -> Result<EventStream, BenchError> {
            let events = vec![
                Ok(StreamEvent::Delta {
                    text: "hello".to_string(),
                }),
                Ok(StreamEvent::Metadata {
                    usage: TokenUsage {
                        input_tokens: 3,
                        output_tokens: 1,
                    },
                }),
            ];
            Ok(futures::stream::iter(events).boxed())
        }
    }

    #[tokio::test]
    async fn test_endpoint_trait_object() {
        let endpoint: Box<dyn StreamingEndpoint> = Box::new(SingleChunkEndpoint);
        let request = StreamRequest {
            endpoint_id: "deepseek.v3-v1:0".to_string(),
            system: None,
            user: "hi".to_string(),
            max_tokens: 16,
            temperature: 0.7,
            top_p: 0.9,
        };

        let stream = endpoint.open(&request).await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::Delta { ref text }) if text == "hello"
        ));
    }

    #[test]
    fn test_request_serialization_skips_absent_system() {
        let request = StreamRequest {
            endpoint_id: "deepseek.v3-v1:0".to_string(),
            system: None,
            user: "hi".to_string(),
            max_tokens: 16,
            temperature: 0.7,
            top_p: 0.9,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("system"));
    }
}
