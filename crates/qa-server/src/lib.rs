//! QA service: configuration, Postgres recording and the HTTP surface
//! around [`qa_coordination::Orchestrator`].

pub mod config;
pub mod pg_recorder;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use qa_coordination::{GatewayClient, MemoryRecorder, Orchestrator, ProbeClient, RunRecorder};
use tracing::{info, warn};

pub use config::ServiceConfig;
pub use pg_recorder::PostgresRecorder;
pub use server::router;

/// Postgres when a database URL is configured, in-memory otherwise.
pub async fn build_recorder(config: &ServiceConfig) -> Result<Arc<dyn RunRecorder>> {
    match &config.database_url {
        Some(url) => {
            let recorder = PostgresRecorder::connect(url)
                .await
                .context("Failed to connect to the run database")?;
            recorder
                .ensure_schema()
                .await
                .context("Failed to prepare run tables")?;
            info!("recording runs to postgres");
            Ok(Arc::new(recorder))
        }
        None => {
            warn!("QA_DATABASE_URL not set; runs are kept in memory only");
            Ok(Arc::new(MemoryRecorder::default()))
        }
    }
}

/// Wire an orchestrator from configuration.
pub fn build_orchestrator(config: &ServiceConfig, recorder: Arc<dyn RunRecorder>) -> Result<Orchestrator> {
    let probe = ProbeClient::new(config.probe_config()).context("Failed to build probe client")?;
    let mut orchestrator = Orchestrator::new(probe, recorder)
        .with_catalog(config.load_catalog()?)
        .with_simulator_config(config.simulator_config())
        .with_environment(config.environment.clone());

    match config.gateway_config() {
        Some(gateway) => {
            let client = GatewayClient::new(gateway).context("Failed to build AI gateway client")?;
            orchestrator = orchestrator.with_model(Arc::new(client));
            info!(url = %config.ai_gateway_url, "AI planning and analysis enabled");
        }
        None => warn!("QA_AI_API_KEY not set; using fallback plans and analysis"),
    }
    Ok(orchestrator)
}
