//! Model endpoint registry.

use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};

/// Static description of a benchmarkable model endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Bedrock model identifier passed on the wire.
    pub endpoint_id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Model provider.
    pub provider: String,
    /// Maximum context window in tokens.
    pub max_context_tokens: u32,
}

impl ModelSpec {
    fn new(endpoint_id: &str, display_name: &str, provider: &str, max_context_tokens: u32) -> Self {
        Self {
            endpoint_id: endpoint_id.to_string(),
            display_name: display_name.to_string(),
            provider: provider.to_string(),
            max_context_tokens,
        }
    }

    /// All registered models, keyed by short name.
    pub fn registry() -> Vec<(&'static str, ModelSpec)> {
        vec![
            (
                "deepseek",
                ModelSpec::new("deepseek.v3-v1:0", "DeepSeek V3", "DeepSeek", 128_000),
            ),
            (
                "minimax",
                // MiniMax M2 supports a 192K context window (196608 tokens).
                ModelSpec::new("minimax.minimax-m2", "MiniMax M2", "MiniMax", 196_608),
            ),
        ]
    }

    /// Look up a model by short name, case-insensitively.
    ///
    /// # Errors
    /// Returns [`BenchError::UnsupportedModel`] for unknown names.
    pub fn lookup(name: &str) -> BenchResult<ModelSpec> {
        let wanted = name.to_lowercase();
        let registry = Self::registry();

        registry
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, spec)| spec.clone())
            .ok_or_else(|| BenchError::UnsupportedModel {
                name: name.to_string(),
                supported: registry
                    .iter()
                    .map(|(key, _)| *key)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Build a spec for a caller-supplied endpoint ID not in the registry.
    ///
    /// Used by the CLI's `--model-id` escape hatch; context limit is
    /// unknown, so it is reported as zero.
    pub fn custom(endpoint_id: impl Into<String>) -> Self {
        let endpoint_id = endpoint_id.into();
        Self {
            display_name: endpoint_id.clone(),
            provider: "custom".to_string(),
            max_context_tokens: 0,
            endpoint_id,
        }
    }
}
