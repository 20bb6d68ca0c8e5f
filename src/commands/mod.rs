//! CLI command implementations.

pub mod models;
pub mod perf;
pub mod quick;

use anyhow::Result;
use bench_client::{BedrockConfig, BedrockEndpoint, MeasuredClient, RetryConfig};
use bench_core::ModelSpec;
use std::sync::Arc;

/// Resolve a model from either a registry short name or a raw endpoint ID.
pub fn resolve_model(name: &str, model_id: Option<&str>) -> Result<ModelSpec> {
    match model_id {
        Some(id) => Ok(ModelSpec::custom(id)),
        None => Ok(ModelSpec::lookup(name)?),
    }
}

/// Build a measured client for one model endpoint.
pub fn build_client(
    region: &str,
    endpoint_url: Option<&str>,
    endpoint_id: &str,
) -> Result<MeasuredClient> {
    let mut builder = BedrockConfig::builder().region(region);
    if let Some(url) = endpoint_url {
        builder = builder.endpoint_url(url);
    }

    let endpoint = BedrockEndpoint::new(builder.build())?;
    Ok(MeasuredClient::new(
        Arc::new(endpoint),
        endpoint_id,
        RetryConfig::default(),
    ))
}
