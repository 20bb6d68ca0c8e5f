//! AWS Bedrock ConverseStream endpoint.
//!
//! Issues one `converse-stream` call per invocation, signed with SigV4,
//! and decodes the binary event-stream response into [`StreamEvent`]s.
//! SDK-level retries are disabled; the application-level retry policy in
//! [`crate::client::MeasuredClient`] is the only retry loop, so backoff
//! delay can never pollute TTFT measurements.

use crate::eventstream::{EventStreamDecoder, Frame};
use crate::sigv4::{self, Credentials};
use async_trait::async_trait;
use bench_core::{BenchError, EventStream, StreamEvent, StreamRequest, StreamingEndpoint, TokenUsage};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Bedrock endpoint configuration.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    /// AWS region (e.g. "us-east-2").
    pub region: String,
    /// AWS access key ID; falls back to `AWS_ACCESS_KEY_ID`.
    pub access_key_id: Option<String>,
    /// AWS secret access key; falls back to `AWS_SECRET_ACCESS_KEY`.
    pub secret_access_key: Option<String>,
    /// AWS session token for temporary credentials.
    pub session_token: Option<String>,
    /// Custom endpoint URL, for tests and VPC endpoints.
    pub endpoint_url: Option<String>,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Total request timeout covering the whole stream.
    pub read_timeout: Duration,
}

impl BedrockConfig {
    /// Create a new builder.
    pub fn builder() -> BedrockConfigBuilder {
        BedrockConfigBuilder::default()
    }

    /// The Bedrock runtime base URL.
    pub fn base_url(&self) -> String {
        self.endpoint_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }
}

/// Builder for [`BedrockConfig`].
#[derive(Debug, Default)]
pub struct BedrockConfigBuilder {
    region: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    endpoint_url: Option<String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl BedrockConfigBuilder {
    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the AWS access key ID.
    pub fn access_key_id(mut self, key: impl Into<String>) -> Self {
        self.access_key_id = Some(key.into());
        self
    }

    /// Set the AWS secret access key.
    pub fn secret_access_key(mut self, secret: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret.into());
        self
    }

    /// Set the AWS session token.
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Set a custom endpoint URL.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the total request timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BedrockConfig {
        BedrockConfig {
            region: self.region.unwrap_or_else(|| "us-east-2".to_string()),
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            session_token: self.session_token,
            endpoint_url: self.endpoint_url,
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(10)),
            read_timeout: self.read_timeout.unwrap_or(Duration::from_secs(300)),
        }
    }
}

/// Streaming endpoint backed by the Bedrock ConverseStream API.
pub struct BedrockEndpoint {
    config: BedrockConfig,
    credentials: Credentials,
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for BedrockEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockEndpoint")
            .field("region", &self.config.region)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BedrockEndpoint {
    /// Create an endpoint from configuration, resolving credentials from
    /// the config or the standard AWS environment variables.
    pub fn new(config: BedrockConfig) -> Result<Self, BenchError> {
        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: config.session_token.clone(),
            },
            _ => Credentials::from_env()?,
        };

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| BenchError::configuration(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url();
        Ok(Self {
            config,
            credentials,
            client,
            base_url,
        })
    }

    /// The converse-stream URL for a model.
    fn stream_url(&self, endpoint_id: &str) -> String {
        format!("{}/model/{}/converse-stream", self.base_url, endpoint_id)
    }

    /// Build the Converse API request body.
    fn build_body(request: &StreamRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": [{
                "role": "user",
                "content": [{"text": request.user}]
            }],
            "inferenceConfig": {
                "maxTokens": request.max_tokens,
                "temperature": request.temperature,
                "topP": request.top_p
            }
        });

        if let Some(ref system) = request.system {
            body["system"] = serde_json::json!([{"text": system}]);
        }

        body
    }
}

#[async_trait]
impl StreamingEndpoint for BedrockEndpoint {
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, BenchError> {
        let url = self.stream_url(&request.endpoint_id);
        let body = Self::build_body(request);
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| BenchError::internal(format!("failed to serialize request: {e}")))?;

        let headers = sigv4::sign_request(
            &self.credentials,
            "POST",
            &url,
            &self.config.region,
            "bedrock",
            &body_bytes,
            &[
                ("content-type", "application/json"),
                ("accept", "application/vnd.amazon.eventstream"),
            ],
            chrono::Utc::now(),
        )?;

        let mut req = self.client.post(&url);
        for (name, value) in &headers {
            req = req.header(name, value);
        }

        debug!(endpoint_id = %request.endpoint_id, "opening converse-stream");

        let read_timeout = self.config.read_timeout;
        let response = req
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| map_transport_error(e, read_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let header_code = response
                .headers()
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(':').next().unwrap_or(v).to_string());

            let bytes = response.bytes().await.unwrap_or_default();
            let parsed: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();

            return Err(BenchError::api(
                status.as_u16(),
                header_code.or_else(|| parsed.code()).unwrap_or_else(|| "UnknownError".to_string()),
                parsed.message(),
            ));
        }

        let byte_stream = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = EventStreamDecoder::new();
            let mut byte_stream = std::pin::pin!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(map_transport_error(e, read_timeout));
                        return;
                    }
                };
                decoder.feed(&bytes);

                loop {
                    match decoder.next_frame() {
                        Ok(Some(frame)) => match frame_to_event(&frame) {
                            Ok(Some(event)) => yield Ok(event),
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        },
                        Ok(None) => break,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Map a decoded frame to a stream event.
///
/// Event types other than `contentBlockDelta` and `metadata` carry no
/// timing-relevant information and are skipped. Exception frames become
/// in-stream API faults with the status implied by their code.
fn frame_to_event(frame: &Frame) -> Result<Option<StreamEvent>, BenchError> {
    if frame.message_type() == Some("exception") {
        let code = normalize_exception_code(frame.exception_type().unwrap_or("UnknownException"));
        let body: ErrorBody = serde_json::from_slice(&frame.payload).unwrap_or_default();
        return Err(BenchError::api(
            status_for_exception(&code),
            code,
            body.message(),
        ));
    }

    match frame.event_type() {
        Some("contentBlockDelta") => {
            let payload: DeltaPayload = serde_json::from_slice(&frame.payload)
                .map_err(|e| BenchError::parse(format!("bad contentBlockDelta payload: {e}")))?;
            Ok(payload
                .delta
                .and_then(|d| d.text)
                .map(|text| StreamEvent::Delta { text }))
        }
        Some("metadata") => {
            let payload: MetadataPayload = serde_json::from_slice(&frame.payload)
                .map_err(|e| BenchError::parse(format!("bad metadata payload: {e}")))?;
            let usage = payload.usage.unwrap_or_default();
            Ok(Some(StreamEvent::Metadata {
                usage: TokenUsage {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                },
            }))
        }
        _ => Ok(None),
    }
}

/// The wire carries exception codes in lower camel case
/// ("throttlingException"); normalize to the Pascal-case form used by the
/// error taxonomy.
fn normalize_exception_code(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn status_for_exception(code: &str) -> u16 {
    match code {
        "ThrottlingException" => 429,
        "ServiceUnavailableException" => 503,
        "ModelTimeoutException" => 408,
        "ValidationException" => 400,
        "AccessDeniedException" => 403,
        "ResourceNotFoundException" => 404,
        "ModelStreamErrorException" | "InternalServerException" => 500,
        _ => 500,
    }
}

fn map_transport_error(error: reqwest::Error, read_timeout: Duration) -> BenchError {
    if error.is_timeout() {
        BenchError::timeout(read_timeout.as_millis() as u64)
    } else if error.is_connect() {
        BenchError::connection(error.to_string())
    } else {
        BenchError::streaming(error.to_string())
    }
}

/// Bedrock error response body.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "Message")]
    message_alt: Option<String>,
    #[serde(rename = "__type")]
    error_type: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.message_alt.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// The `__type` field may carry a URI prefix; only the fragment is the
    /// error code.
    fn code(&self) -> Option<String> {
        self.error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
    }
}

#[derive(Debug, Deserialize)]
struct DeltaPayload {
    delta: Option<DeltaContent>,
}

#[derive(Debug, Deserialize)]
struct DeltaContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataPayload {
    usage: Option<UsagePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct UsagePayload {
    #[serde(rename = "inputTokens", default)]
    input_tokens: u32,
    #[serde(rename = "outputTokens", default)]
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventstream::encode_frame;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint_url: &str) -> BedrockConfig {
        BedrockConfig::builder()
            .region("us-east-2")
            .access_key_id("AKIDEXAMPLE")
            .secret_access_key("secret")
            .endpoint_url(endpoint_url)
            .build()
    }

    fn test_request() -> StreamRequest {
        StreamRequest {
            endpoint_id: "deepseek.v3-v1:0".to_string(),
            system: Some("You are a helpful assistant.".to_string()),
            user: "Summarize the documents.".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    #[test]
    fn test_default_base_url() {
        let config = BedrockConfig::builder().region("eu-west-1").build();
        assert_eq!(
            config.base_url(),
            "https://bedrock-runtime.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_custom_endpoint_url() {
        let config = test_config("http://localhost:4566");
        assert_eq!(config.base_url(), "http://localhost:4566");
    }

    #[test]
    fn test_stream_url() {
        let endpoint = BedrockEndpoint::new(test_config("http://localhost:4566")).unwrap();
        assert_eq!(
            endpoint.stream_url("deepseek.v3-v1:0"),
            "http://localhost:4566/model/deepseek.v3-v1:0/converse-stream"
        );
    }

    #[test]
    fn test_build_body() {
        let body = BedrockEndpoint::build_body(&test_request());

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(
            body["messages"][0]["content"][0]["text"],
            "Summarize the documents."
        );
        assert_eq!(body["system"][0]["text"], "You are a helpful assistant.");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 256);
        assert_eq!(body["inferenceConfig"]["topP"], 0.9);
    }

    #[test]
    fn test_build_body_without_system() {
        let mut request = test_request();
        request.system = None;
        let body = BedrockEndpoint::build_body(&request);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_normalize_exception_code() {
        assert_eq!(
            normalize_exception_code("throttlingException"),
            "ThrottlingException"
        );
        assert_eq!(
            normalize_exception_code("ServiceUnavailableException"),
            "ServiceUnavailableException"
        );
    }

    #[tokio::test]
    async fn test_open_success_decodes_events() {
        let server = MockServer::start().await;

        let mut body = encode_frame(
            &[(":message-type", "event"), (":event-type", "messageStart")],
            br#"{"role":"assistant"}"#,
        );
        body.extend(encode_frame(
            &[(":message-type", "event"), (":event-type", "contentBlockDelta")],
            br#"{"contentBlockIndex":0,"delta":{"text":"Hello"}}"#,
        ));
        body.extend(encode_frame(
            &[(":message-type", "event"), (":event-type", "contentBlockDelta")],
            br#"{"contentBlockIndex":0,"delta":{"text":", world"}}"#,
        ));
        body.extend(encode_frame(
            &[(":message-type", "event"), (":event-type", "messageStop")],
            br#"{"stopReason":"end_turn"}"#,
        ));
        body.extend(encode_frame(
            &[(":message-type", "event"), (":event-type", "metadata")],
            br#"{"usage":{"inputTokens":42,"outputTokens":7}}"#,
        ));

        Mock::given(method("POST"))
            .and(path("/model/deepseek.v3-v1:0/converse-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/vnd.amazon.eventstream")
                    .set_body_bytes(body),
            )
            .mount(&server)
            .await;

        let endpoint = BedrockEndpoint::new(test_config(&server.uri())).unwrap();
        let stream = endpoint.open(&test_request()).await.unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::Delta { ref text }) if text == "Hello"
        ));
        assert!(matches!(
            events[1],
            Ok(StreamEvent::Delta { ref text }) if text == ", world"
        ));
        assert!(matches!(
            events[2],
            Ok(StreamEvent::Metadata { usage }) if usage.input_tokens == 42 && usage.output_tokens == 7
        ));
    }

    #[tokio::test]
    async fn test_open_maps_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-amzn-errortype", "ThrottlingException:http://internal")
                    .set_body_string(r#"{"message":"Too many requests, please wait"}"#),
            )
            .mount(&server)
            .await;

        let endpoint = BedrockEndpoint::new(test_config(&server.uri())).unwrap();
        let err = endpoint.open(&test_request()).await.err().unwrap();

        match err {
            BenchError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 429);
                assert_eq!(code, "ThrottlingException");
                assert_eq!(message, "Too many requests, please wait");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(BenchError::api(429, "ThrottlingException", "x").is_retryable());
    }

    #[tokio::test]
    async fn test_exception_frame_surfaces_mid_stream() {
        let server = MockServer::start().await;

        let mut body = encode_frame(
            &[(":message-type", "event"), (":event-type", "contentBlockDelta")],
            br#"{"delta":{"text":"partial"}}"#,
        );
        body.extend(encode_frame(
            &[
                (":message-type", "exception"),
                (":exception-type", "throttlingException"),
            ],
            br#"{"message":"Rate exceeded"}"#,
        ));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let endpoint = BedrockEndpoint::new(test_config(&server.uri())).unwrap();
        let stream = endpoint.open(&test_request()).await.unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        match events[1].as_ref().unwrap_err() {
            BenchError::Api { status, code, .. } => {
                assert_eq!(*status, 429);
                assert_eq!(code, "ThrottlingException");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_request_is_signed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
            .mount(&server)
            .await;

        let endpoint = BedrockEndpoint::new(test_config(&server.uri())).unwrap();
        let _ = endpoint.open(&test_request()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let auth = requests[0]
            .headers
            .get("authorization")
            .expect("authorization header")
            .to_str()
            .unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256"));
        assert!(auth.contains("/us-east-2/bedrock/aws4_request"));
        assert!(requests[0].headers.contains_key("x-amz-content-sha256"));
    }
}
