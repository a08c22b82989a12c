//! Public WAN address discovery.

use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

const DEFAULT_ENDPOINT: &str = "https://api.ipify.org?format=json";

/// How long a single lookup may take before it counts as unreachable.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of the caller's current public address.
///
/// The poll engine only cares about presence or absence: every failure
/// cause (timeout, HTTP error, unusable body) collapses to `None` behind
/// this seam.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// The current WAN address, or `None` if it could not be determined.
    async fn public_address(&self) -> Option<IpAddr>;
}

/// WAN address detector backed by a JSON echo service.
pub struct IpDetector {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

impl IpDetector {
    /// Create a detector for the default echo service.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string())
    }

    /// Create a detector for a custom echo endpoint (for testing).
    pub fn with_endpoint(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    /// Ask the echo service for the caller's address.
    pub async fn lookup(&self) -> Result<IpAddr> {
        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(DdnsError::IpLookup(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let body: EchoResponse = response
            .json()
            .await
            .map_err(|e| DdnsError::IpLookup(format!("Unusable response body: {}", e)))?;

        body.ip
            .parse()
            .map_err(|_| DdnsError::IpLookup(format!("Invalid address in response: {}", body.ip)))
    }
}

impl Default for IpDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressSource for IpDetector {
    async fn public_address(&self) -> Option<IpAddr> {
        match self.lookup().await {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!("WAN address lookup failed: {}", e);
                None
            }
        }
    }
}
