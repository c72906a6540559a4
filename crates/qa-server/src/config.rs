use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use qa_coordination::{Catalog, GatewayConfig, ProbeConfig, SimulatorConfig};

/// Service configuration, read from `QA_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the platform's functions; endpoint `name` is `{url}/{name}`.
    pub functions_url: String,
    /// Bearer token sent with every probe (optional)
    pub service_key: Option<String>,
    /// OpenAI-compatible chat-completions URL
    pub ai_gateway_url: String,
    /// AI planning and analysis are disabled without a key.
    pub ai_api_key: Option<String>,
    /// Postgres connection string; in-memory recording when unset.
    pub database_url: Option<String>,
    pub probe_timeout: Duration,
    pub ai_timeout: Duration,
    pub bind: SocketAddr,
    /// Stored in every run row.
    pub environment: String,
    /// TOML persona/journey catalog replacing the built-ins.
    pub catalog_path: Option<PathBuf>,
    pub think_time_cap: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            functions_url: "http://127.0.0.1:54321/functions/v1".into(),
            service_key: None,
            ai_gateway_url: "https://openrouter.ai/api/v1/chat/completions".into(),
            ai_api_key: None,
            database_url: None,
            probe_timeout: Duration::from_secs(30),
            ai_timeout: Duration::from_secs(30),
            bind: SocketAddr::from(([0, 0, 0, 0], 8787)),
            environment: "development".into(),
            catalog_path: None,
            think_time_cap: Duration::from_millis(500),
        }
    }
}

/// Non-empty value of an environment variable.
fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {name}"))
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            functions_url: var("QA_FUNCTIONS_URL").unwrap_or(defaults.functions_url),
            service_key: var("QA_SERVICE_KEY"),
            ai_gateway_url: var("QA_AI_GATEWAY_URL").unwrap_or(defaults.ai_gateway_url),
            ai_api_key: var("QA_AI_API_KEY"),
            database_url: var("QA_DATABASE_URL"),
            probe_timeout: parse_var::<u64>("QA_PROBE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            ai_timeout: parse_var::<u64>("QA_AI_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ai_timeout),
            bind: parse_var::<SocketAddr>("QA_BIND")?.unwrap_or(defaults.bind),
            environment: var("QA_ENVIRONMENT").unwrap_or(defaults.environment),
            catalog_path: var("QA_CATALOG_PATH").map(PathBuf::from),
            think_time_cap: parse_var::<u64>("QA_THINK_TIME_CAP_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.think_time_cap),
        })
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            base_url: self.functions_url.clone(),
            service_key: self.service_key.clone(),
            timeout: self.probe_timeout,
        }
    }

    /// `None` when no AI key is configured.
    pub fn gateway_config(&self) -> Option<GatewayConfig> {
        self.ai_api_key.as_ref().map(|key| {
            GatewayConfig::new(self.ai_gateway_url.clone(), key.clone()).with_timeout(self.ai_timeout)
        })
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            think_time_cap: self.think_time_cap,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display())),
            None => Ok(Catalog::builtin()),
        }
    }
}
