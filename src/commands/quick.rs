//! Single measured invocation command.

use anyhow::{bail, Result};
use bench_client::InvokeParams;
use clap::Args;

use crate::commands::{build_client, resolve_model};
use crate::output;

/// Arguments for the quick command.
#[derive(Args, Debug)]
pub struct QuickArgs {
    /// Registered model short name
    #[arg(short, long, default_value = "deepseek")]
    pub model: String,

    /// Raw Bedrock model ID, bypassing the registry
    #[arg(long, conflicts_with = "model")]
    pub model_id: Option<String>,

    /// User prompt to send
    #[arg(short, long, default_value = "Explain the difference between latency and throughput in two sentences.")]
    pub prompt: String,

    /// Optional system prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Maximum output tokens
    #[arg(long, default_value = "512")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(short, long, default_value = "0.7")]
    pub temperature: f32,

    /// Print the full model response
    #[arg(long)]
    pub show_response: bool,
}

/// Execute the quick command.
pub async fn execute(
    args: QuickArgs,
    region: &str,
    endpoint_url: Option<&str>,
    json: bool,
) -> Result<()> {
    let model = resolve_model(&args.model, args.model_id.as_deref())?;
    let client = build_client(region, endpoint_url, &model.endpoint_id)?;

    let mut params = InvokeParams::new(args.prompt.clone())
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .retain_response(args.show_response);
    if let Some(ref system) = args.system {
        params = params.system_prompt(system.clone());
    }

    let result = client.invoke(&params).await;

    if json {
        output::json(&result)?;
    } else {
        output::section(&format!("Quick Test: {}", model.display_name));
        output::key_value("Endpoint", &model.endpoint_id);
        output::key_value("Region", region);

        if result.is_success() {
            println!();
            output::success("invocation succeeded");
            output::key_value("TTFT", &output::format_ms(result.ttft_ms));
            output::key_value("Total time", &output::format_ms(result.total_time_ms));
            output::key_value("Input tokens", &result.input_tokens.to_string());
            output::key_value("Output tokens", &result.output_tokens.to_string());
            output::key_value("Throughput", &output::format_tps(result.tokens_per_sec));
            output::key_value(
                "Avg per token",
                &output::format_ms(result.avg_ms_per_token),
            );

            if let Some(ref text) = result.response_text {
                output::section("Response");
                println!("{text}");
            }
        } else {
            let message = result
                .error_message
                .clone()
                .unwrap_or_else(|| "unknown failure".to_string());
            output::error(&format!(
                "invocation failed (HTTP {}): {message}",
                result.http_status_code
            ));
        }
    }

    if !result.is_success() {
        bail!("invocation failed");
    }
    Ok(())
}
