//! Model registry listing command.

use anyhow::Result;
use bench_core::ModelSpec;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output;

/// Arguments for the models command.
#[derive(Args, Debug)]
pub struct ModelsArgs {}

/// One registry row.
#[derive(Debug, Serialize, Tabled)]
pub struct ModelRow {
    pub name: String,
    pub endpoint_id: String,
    pub display_name: String,
    pub provider: String,
    pub max_context_tokens: u32,
}

/// Execute the models command.
pub fn execute(_args: ModelsArgs, json: bool) -> Result<()> {
    let rows: Vec<ModelRow> = ModelSpec::registry()
        .into_iter()
        .map(|(name, spec)| ModelRow {
            name: name.to_string(),
            endpoint_id: spec.endpoint_id,
            display_name: spec.display_name,
            provider: spec.provider,
            max_context_tokens: spec.max_context_tokens,
        })
        .collect();

    if json {
        output::json(&rows)?;
    } else {
        output::section("Registered Models");
        output::table(&rows);
    }

    Ok(())
}
