//! Shared helpers for integration tests: in-process mock endpoints.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use qa_coordination::{ProbeClient, ProbeConfig, SimulatorConfig};

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe port");
    let addr = listener.local_addr().expect("probe port address");
    drop(listener);
    format!("http://{addr}")
}

pub fn probe_client(base_url: &str) -> ProbeClient {
    ProbeClient::new(ProbeConfig {
        base_url: base_url.to_string(),
        service_key: None,
        timeout: Duration::from_secs(5),
    })
    .expect("probe client")
}

pub fn fast_simulator() -> SimulatorConfig {
    SimulatorConfig {
        think_time_cap: Duration::from_millis(5),
    }
}
