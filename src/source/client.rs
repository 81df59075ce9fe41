use std::time::Duration;

use anyhow::{Context, Result};

pub const USER_AGENT: &str = concat!("race-ranker/", env!("CARGO_PKG_VERSION"), " (personal research tool)");

/// Install the ring crypto provider for rustls 0.23+. Later calls are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Create an HTTP client with a per-request timeout
pub fn create_client(timeout: Duration) -> Result<reqwest::Client> {
    install_crypto_provider();
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}
