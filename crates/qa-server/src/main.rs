use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qa_coordination::{ComplianceRequest, ModelChoice, RunRequest, TestRunRequest, UxRequest};
use qa_server::{build_orchestrator, build_recorder, server, ServiceConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "qa-server", version, about = "Automated QA for the engineering platform")]
struct Cli {
    /// Persona/journey catalog (overrides QA_CATALOG_PATH)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP endpoints
    Serve {
        /// Listen address (overrides QA_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run a feature test battery and print the report
    Tests {
        #[arg(long, default_value = "all")]
        feature: String,
        /// Skip AI planning and analysis
        #[arg(long)]
        no_ai: bool,
        #[arg(long, value_parser = parse_model, default_value = "claude")]
        model: ModelChoice,
    },
    /// Simulate persona journeys and print the report
    Ux {
        #[arg(long, value_delimiter = ',')]
        personas: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        journeys: Option<Vec<String>>,
    },
    /// Validate calculators against benchmarks and code rules
    Validate {
        #[arg(long, value_delimiter = ',')]
        calculators: Option<Vec<String>>,
    },
}

fn parse_model(raw: &str) -> Result<ModelChoice, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown model '{raw}' (expected claude, gemini or deepseek)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::from_env()?;
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog;
    }
    info!(
        functions = %config.functions_url,
        environment = %config.environment,
        "qa-server starting"
    );

    let recorder = build_recorder(&config).await?;
    let orchestrator = Arc::new(build_orchestrator(&config, recorder)?);

    let request = match cli.command {
        Command::Serve { bind } => {
            return server::serve(orchestrator, bind.unwrap_or(config.bind)).await;
        }
        Command::Tests {
            feature,
            no_ai,
            model,
        } => RunRequest::Tests(TestRunRequest {
            feature,
            include_ai: !no_ai,
            model,
        }),
        Command::Ux { personas, journeys } => RunRequest::Ux(UxRequest { personas, journeys }),
        Command::Validate { calculators } => RunRequest::Compliance(ComplianceRequest { calculators }),
    };

    let report = orchestrator.run(request).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
