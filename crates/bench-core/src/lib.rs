//! # Bench Core
//!
//! Core types, traits, and error handling for the Bedrock streaming
//! benchmark.
//!
//! This crate provides the foundational types used throughout the tool:
//! - Trial result and statistics value objects
//! - The streaming endpoint abstraction
//! - The model endpoint registry
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod stats;
pub mod streaming;
pub mod trial;

// Re-export commonly used types
pub use error::{BenchError, BenchResult};
pub use model::ModelSpec;
pub use stats::Statistics;
pub use streaming::{EventStream, StreamEvent, StreamRequest, StreamingEndpoint, TokenUsage};
pub use trial::TrialResult;
