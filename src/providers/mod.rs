//! DNS record update providers.

mod linode;

pub use linode::LinodeProvider;

use crate::error::Result;
use async_trait::async_trait;
use std::net::IpAddr;

#[cfg(test)]
use mockall::automock;

#[cfg(test)]
mod tests;

/// A provider that can point one pre-configured DNS record at a new address.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fully qualified name of the record being managed.
    fn record_name(&self) -> &str;

    /// Point the record at `ip`.
    ///
    /// `Ok(())` means the provider accepted the update; any error means
    /// the record was left as it was.
    async fn push_address(&self, ip: IpAddr) -> Result<()>;
}
