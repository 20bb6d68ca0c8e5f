//! Benchmark orchestration: synthetic context generation, single-trial
//! execution with adaptive pacing, multi-trial batches with warmup, and
//! statistics reduction.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod reduce;
pub mod runner;

pub use context::{estimate_tokens, generate_context, ContextSpec};
pub use reduce::compute_statistics;
pub use runner::{BatchConfig, BatchOutcome, TrialRunner};
