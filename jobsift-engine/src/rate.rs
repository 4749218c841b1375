use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use jobsift_common::SourceError;
use jobsift_config::{DelaySettings, GlobalSettings};
use jobsift_drivers::browser::behavioral::pick_delay;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Token bucket with a burst of one, refilled every `interval`.
///
/// Callers reserve the next free slot under a FIFO mutex and then sleep until
/// it comes up. Grants follow arrival order.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a grant. A cancelled wait keeps its reservation.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), SourceError> {
        if self.interval.is_zero() {
            return if cancel.is_cancelled() {
                Err(SourceError::Cancelled)
            } else {
                Ok(())
            };
        }

        let slot = {
            let mut next = tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                guard = self.next_slot.lock() => guard,
            };
            let now = Instant::now();
            let slot = next.map_or(now, |at| at.max(now));
            *next = Some(slot + self.interval);
            slot
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            _ = sleep_until(slot) => Ok(()),
        }
    }
}

/// Request pacing for the markup/feed phase: one global gate, one gate per
/// host, and a jittered delay before each request.
#[derive(Debug)]
pub struct RateManager {
    global: Pacer,
    hosts: DashMap<String, Arc<Pacer>>,
    jitter: DelaySettings,
}

impl RateManager {
    pub fn new(settings: &GlobalSettings) -> Self {
        Self {
            global: Pacer::new(Duration::from_millis(settings.delay.min_ms)),
            hosts: DashMap::new(),
            jitter: settings.delay,
        }
    }

    fn host_pacer(&self, endpoint: &str, rate_limit_ms: u64) -> Option<Arc<Pacer>> {
        if rate_limit_ms == 0 {
            return None;
        }
        let host = Url::parse(endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| endpoint.to_string());
        let pacer = self
            .hosts
            .entry(host)
            .or_insert_with(|| Arc::new(Pacer::new(Duration::from_millis(rate_limit_ms))))
            .clone();
        Some(pacer)
    }

    /// Everything a markup/feed task waits on before its one request.
    pub async fn before_request(
        &self,
        endpoint: &str,
        rate_limit_ms: u64,
        cancel: &CancellationToken,
    ) -> Result<(), SourceError> {
        self.global.acquire(cancel).await?;

        if let Some(pacer) = self.host_pacer(endpoint, rate_limit_ms) {
            pacer.acquire(cancel).await?;
        }

        if self.jitter.max_ms > self.jitter.min_ms {
            let delay = Duration::from_millis(pick_delay(self.jitter.min_ms, self.jitter.max_ms));
            tracing::trace!(delay_ms = delay.as_millis() as u64, "rate.jitter");
            tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
        Ok(())
    }
}
