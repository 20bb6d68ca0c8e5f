//! # Bench Client
//!
//! The measured streaming invocation client and the AWS Bedrock
//! ConverseStream endpoint behind it.
//!
//! The client performs one streaming call per trial, measures TTFT and
//! total time with a fresh monotonic timer per attempt, and applies a
//! bounded exponential-backoff retry policy whose sleeps are never charged
//! to any trial's timing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bedrock;
pub mod client;
pub mod eventstream;
pub mod retry;
mod sigv4;

pub use bedrock::{BedrockConfig, BedrockEndpoint};
pub use client::{InvokeParams, MeasuredClient};
pub use retry::RetryConfig;
