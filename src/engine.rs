//! The poll engine: resolve, compare, conditionally update, signal.
//!
//! One engine owns one record. Each cycle it asks the [`AddressSource`]
//! for the WAN address, compares it with the last address it pushed, and
//! calls the [`DnsProvider`] only when they differ. The outcome of every
//! cycle is published through a `watch` channel, so consumers always see
//! the latest state and can never slow the engine down.

use crate::detector::AddressSource;
use crate::providers::DnsProvider;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Notify};
use tracing::{debug, info, warn};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// The WAN address could not be determined.
    Down,
    /// The address matches the last one pushed; no update was sent.
    Unchanged(IpAddr),
    /// The provider accepted an update to this address.
    Updated(IpAddr),
    /// The provider rejected the update; the same address is retried next
    /// cycle.
    Failed(IpAddr),
}

/// Latest engine state, published after every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Outcome of the most recent cycle (`None` before the first one).
    pub result: Option<CheckResult>,
    /// Last address the provider confirmed.
    pub last_known_address: Option<IpAddr>,
    /// When the resolver last returned an address.
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Mutable state owned by the engine. `last_known_address` moves iff a
/// push succeeded for that address; `last_checked_at` moves whenever the
/// resolver answered.
#[derive(Debug, Clone, Copy, Default)]
struct PollState {
    last_known_address: Option<IpAddr>,
    last_checked_at: Option<DateTime<Utc>>,
}

/// Handle that wakes a sleeping engine for an immediate re-check.
#[derive(Clone)]
pub struct RecheckHandle {
    notify: Arc<Notify>,
}

impl RecheckHandle {
    /// Skip the rest of the current sleep and start a cycle now.
    pub fn recheck(&self) {
        self.notify.notify_one();
    }
}

/// Poll loop driving one record.
pub struct PollEngine {
    source: Box<dyn AddressSource>,
    provider: Box<dyn DnsProvider>,
    interval: Duration,
    state: PollState,
    status_tx: watch::Sender<StatusSnapshot>,
    recheck: Arc<Notify>,
}

impl PollEngine {
    /// Create an engine plus the receiver its status flows out of and a
    /// handle for forcing an immediate re-check.
    pub fn new(
        source: Box<dyn AddressSource>,
        provider: Box<dyn DnsProvider>,
        interval: Duration,
    ) -> (Self, watch::Receiver<StatusSnapshot>, RecheckHandle) {
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        let recheck = Arc::new(Notify::new());
        let handle = RecheckHandle {
            notify: recheck.clone(),
        };

        let engine = Self {
            source,
            provider,
            interval,
            state: PollState::default(),
            status_tx,
            recheck,
        };

        (engine, status_rx, handle)
    }

    /// Run a single cycle and publish its outcome.
    pub async fn check_once(&mut self) -> CheckResult {
        let result = self.run_cycle().await;
        self.publish(result);
        result
    }

    async fn run_cycle(&mut self) -> CheckResult {
        let Some(ip) = self.source.public_address().await else {
            debug!("WAN address unavailable");
            return CheckResult::Down;
        };

        self.state.last_checked_at = Some(Utc::now());

        if self.state.last_known_address == Some(ip) {
            debug!("WAN address unchanged: {}", ip);
            return CheckResult::Unchanged(ip);
        }

        match self.provider.push_address(ip).await {
            Ok(()) => {
                info!("{} now points at {}", self.provider.record_name(), ip);
                self.state.last_known_address = Some(ip);
                CheckResult::Updated(ip)
            }
            Err(e) => {
                warn!("Update to {} failed: {}", ip, e);
                CheckResult::Failed(ip)
            }
        }
    }

    fn publish(&self, result: CheckResult) {
        // Receivers may all be gone (one-shot use); that is fine.
        let _ = self.status_tx.send(StatusSnapshot {
            result: Some(result),
            last_known_address: self.state.last_known_address,
            last_checked_at: self.state.last_checked_at,
        });
    }

    /// Run cycles until `shutdown` fires, sleeping `interval` between them.
    ///
    /// Both the in-flight cycle and the sleep race the shutdown signal, so
    /// cancellation never waits out a network call or the interval.
    /// Dropping the sender counts as shutdown too.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            "Poll engine started for {} (interval: {}s)",
            self.provider.record_name(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.check_once() => {}
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.recheck.notified() => {
                    debug!("Immediate re-check requested");
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Poll engine stopped");
    }
}
