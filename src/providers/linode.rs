//! Linode Domains API record updater.

use super::DnsProvider;
use crate::config::Config;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.linode.com";

/// TTL applied to every pushed record, in seconds.
const RECORD_TTL: u32 = 300;

/// How long an update request may take before it counts as failed.
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Updater for a single A/AAAA record in a Linode-hosted zone.
pub struct LinodeProvider {
    client: reqwest::Client,
    api_key: String,
    api_version: String,
    domain_id: String,
    record_id: String,
    fqdn: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest {
    target: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    ttl: u32,
}

impl LinodeProvider {
    /// Create a provider from configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPDATE_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.linode.api_key.clone(),
            api_version: config.linode.api_version.clone(),
            domain_id: config.linode.domain_id.clone(),
            record_id: config.linode.record_id.clone(),
            fqdn: config.dns.fqdn.clone(),
            base_url,
        }
    }

    fn record_url(&self) -> String {
        format!(
            "{}/{}/domains/{}/records/{}",
            self.base_url, self.api_version, self.domain_id, self.record_id
        )
    }
}

#[async_trait]
impl DnsProvider for LinodeProvider {
    fn record_name(&self) -> &str {
        &self.fqdn
    }

    async fn push_address(&self, ip: IpAddr) -> Result<()> {
        let record_type = if ip.is_ipv4() { "A" } else { "AAAA" };
        let url = self.record_url();

        let request = UpdateRequest {
            target: ip.to_string(),
            name: self.fqdn.clone(),
            record_type: record_type.to_string(),
            ttl: RECORD_TTL,
        };

        let response = self
            .client
            .put(&url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        // The Domains API answers 200 with the updated record; anything
        // else means the record was not changed.
        if response.status() == StatusCode::OK {
            tracing::info!("Updated {} ({}) -> {}", self.fqdn, record_type, ip);
            Ok(())
        } else {
            Err(DdnsError::UpdateRejected(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )))
        }
    }
}
