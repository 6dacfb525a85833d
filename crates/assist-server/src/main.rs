//! Billing and HR assistant server
//!
//! Serves two assistants behind the Assist Guard pipeline:
//! - `POST /api/billing-assistant` - subscription billing questions
//! - `POST /api/hr-assistant` - leave-management questions
//! - `GET /health` - liveness and model status
//!
//! Without `OPENAI_API_KEY` every request is answered from the offline
//! fallback texts.

mod app;

use anyhow::Result;
use assist_guard::{
    ApiType, AssistantPipeline, GuardConfig, ModelClient, OpenAiClient, OpenAiSettings,
    UnavailableClient,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Assistant server arguments
#[derive(Parser, Debug)]
#[command(name = "assist-server")]
#[command(about = "Billing and HR assistants with prompt-injection defenses")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, env = "ASSIST_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Model API key; omit to serve fallback responses only
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// `azure` for Azure OpenAI, anything else for the standard API
    #[arg(long, env = "OPENAI_API_TYPE", default_value = "openai")]
    openai_api_type: String,

    /// Endpoint base URL (required for Azure)
    #[arg(long, env = "OPENAI_API_BASE")]
    openai_api_base: Option<String>,

    /// Azure API version
    #[arg(long, env = "OPENAI_API_VERSION", default_value = "2023-05-15")]
    openai_api_version: String,

    /// Model id, or deployment name for Azure
    #[arg(long, env = "OPENAI_MODEL_ID")]
    openai_model_id: Option<String>,
}

fn model_client(args: &Args) -> Result<Arc<dyn ModelClient>> {
    let Some(api_key) = args
        .openai_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
    else {
        warn!("OPENAI_API_KEY is not set, serving fallback responses only");
        return Ok(Arc::new(UnavailableClient));
    };

    let api_type = ApiType::from_env_value(&args.openai_api_type);
    let model = args.openai_model_id.clone().unwrap_or_else(|| {
        match api_type {
            ApiType::Azure => "gpt4",
            ApiType::OpenAi => "gpt-4o",
        }
        .to_string()
    });

    let client = OpenAiClient::new(OpenAiSettings {
        api_key,
        api_type,
        api_base: args
            .openai_api_base
            .clone()
            .filter(|base| !base.trim().is_empty()),
        api_version: args.openai_api_version.clone(),
        model,
    })?;

    info!(
        api_type = ?api_type,
        model = %client.settings().model,
        "Model client configured"
    );

    Ok(Arc::new(client))
}

fn load_config(args: &Args) -> Result<GuardConfig> {
    match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading pipeline config");
            Ok(GuardConfig::load(path)?)
        }
        None => Ok(GuardConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let pipeline = AssistantPipeline::new(config, model_client(&args)?)?;
    info!(
        timeout_ms = pipeline.config().model.timeout_ms,
        "Pipeline ready"
    );
    let app = app::router(app::AppState {
        pipeline: Arc::new(pipeline),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    info!(port = args.port, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["assist-server", "--openai-api-version", "2024-02-01"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_blank_key_means_offline() {
        let args = args(&["--openai-api-key", ""]);
        assert!(!model_client(&args).unwrap().is_configured());
    }

    #[test]
    fn test_azure_requires_base() {
        let args = args(&[
            "--openai-api-key",
            "sk-test",
            "--openai-api-type",
            "azure",
            "--openai-model-id",
            "gpt4",
            "--openai-api-base",
            "",
        ]);
        assert!(model_client(&args).is_err());
    }

    #[test]
    fn test_configured_client() {
        let args = args(&[
            "--openai-api-key",
            "sk-test",
            "--openai-api-type",
            "openai",
            "--openai-model-id",
            "gpt-4o-mini",
        ]);
        assert!(model_client(&args).unwrap().is_configured());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = args(&["--config", "/nonexistent/assist-guard.toml"]);
        assert!(load_config(&args).is_err());
    }
}
