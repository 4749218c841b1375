//! Outbound identity: proxy rotation and user-agent selection.
use std::time::Duration;

use futures::future::join_all;
use jobsift_common::SourceError;
use jobsift_config::{GlobalSettings, ProxySettings};
use jobsift_drivers::browser::fingerprint::desktop_user_agents;
use jobsift_http::{ClientOptions, HttpClient, RequestOpts};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Default)]
struct PoolState {
    proxies: Vec<String>,
    current: usize,
    served: u32,
}

/// Health-checked proxy pool. Empty means direct connections.
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
    rotate_every: u32,
    timeout: Duration,
    health_check_url: String,
}

impl ProxyPool {
    pub fn new(settings: &ProxySettings) -> Self {
        let mut proxies: Vec<String> = if settings.enabled {
            settings
                .proxies
                .iter()
                .filter_map(|raw| match Url::parse(raw.trim()) {
                    Ok(url) => Some(url.to_string()),
                    Err(e) => {
                        tracing::warn!(proxy = %raw, error = %e, "proxy.invalid");
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        proxies.shuffle(&mut rand::thread_rng());

        Self {
            state: Mutex::new(PoolState {
                proxies,
                ..PoolState::default()
            }),
            rotate_every: settings.rotate_every,
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            health_check_url: settings.health_check_url.clone(),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.proxies.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Proxy for the next lease, advancing every `rotate_every` leases.
    pub async fn next(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        if state.proxies.is_empty() {
            return None;
        }
        if self.rotate_every > 0 && state.served >= self.rotate_every {
            state.current = (state.current + 1) % state.proxies.len();
            state.served = 0;
        }
        state.served += 1;
        state.proxies.get(state.current).cloned()
    }

    /// Force a move to the next proxy.
    pub async fn rotate(&self) {
        let mut state = self.state.lock().await;
        if !state.proxies.is_empty() {
            state.current = (state.current + 1) % state.proxies.len();
        }
        state.served = 0;
    }

    pub async fn mark_bad(&self, proxy: &str) {
        let mut state = self.state.lock().await;
        let Some(index) = state.proxies.iter().position(|p| p == proxy) else {
            return;
        };
        state.proxies.remove(index);
        if index < state.current {
            state.current -= 1;
        }
        if state.current >= state.proxies.len() {
            state.current = 0;
        }
        state.served = 0;
        tracing::warn!(proxy = %proxy, remaining = state.proxies.len(), "proxy.marked_bad");
    }

    /// Probe every proxy against the health-check URL and keep the working
    /// ones. Returns how many survived.
    pub async fn check_health(&self) -> usize {
        let candidates = self.state.lock().await.proxies.clone();
        if candidates.is_empty() {
            return 0;
        }

        let probes = candidates.iter().map(|proxy| self.probe(proxy));
        let results = join_all(probes).await;
        let healthy: Vec<String> = candidates
            .into_iter()
            .zip(results)
            .filter_map(|(proxy, ok)| ok.then_some(proxy))
            .collect();

        let mut state = self.state.lock().await;
        tracing::info!(
            checked = state.proxies.len(),
            healthy = healthy.len(),
            "proxy.health_check.complete"
        );
        state.proxies = healthy;
        state.current = 0;
        state.served = 0;
        state.proxies.len()
    }

    async fn probe(&self, proxy: &str) -> bool {
        let client = match HttpClient::unanchored(ClientOptions {
            proxy: Some(proxy.to_string()),
            ..ClientOptions::default()
        }) {
            Ok(client) => client.with_timeout(self.timeout).with_retries(0),
            Err(e) => {
                tracing::debug!(proxy = %proxy, error = %e, "proxy.client_failed");
                return false;
            }
        };
        match client
            .get_text(&self.health_check_url, RequestOpts::default())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(proxy = %proxy, error = %e, "proxy.unhealthy");
                false
            }
        }
    }
}

/// User agents handed out per lease.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
    rotate: bool,
    fallback: String,
}

impl UserAgentPool {
    pub fn new(rotate: bool, fallback: impl Into<String>) -> Self {
        Self {
            agents: desktop_user_agents(),
            rotate,
            fallback: fallback.into(),
        }
    }

    pub fn pick(&self) -> String {
        if self.rotate {
            if let Some(agent) = self.agents.choose(&mut rand::thread_rng()) {
                return agent.clone();
            }
        }
        self.fallback.clone()
    }
}

/// What a single source task fetches with.
#[derive(Clone)]
pub struct Lease {
    pub proxy: Option<String>,
    pub user_agent: String,
    pub client: HttpClient,
}

/// Builds HTTP clients carrying the next proxy and user agent.
#[derive(Debug)]
pub struct IdentityManager {
    proxies: ProxyPool,
    agents: UserAgentPool,
    timeout: Duration,
    retries: usize,
}

impl IdentityManager {
    pub fn new(settings: &GlobalSettings) -> Self {
        let rotate_agents = settings.proxy.enabled && settings.proxy.rotate_user_agents;
        Self {
            proxies: ProxyPool::new(&settings.proxy),
            agents: UserAgentPool::new(rotate_agents, settings.user_agent.clone()),
            timeout: Duration::from_millis(settings.timeout_ms.max(1)),
            retries: settings.retry_attempts as usize,
        }
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }

    pub async fn lease(&self) -> Result<Lease, SourceError> {
        let proxy = self.proxies.next().await;
        let user_agent = self.agents.pick();
        let client = HttpClient::unanchored(ClientOptions {
            user_agent: Some(user_agent.clone()),
            proxy: proxy.clone(),
            ..ClientOptions::default()
        })?
        .with_timeout(self.timeout)
        .with_retries(self.retries);

        Ok(Lease {
            proxy,
            user_agent,
            client,
        })
    }
}
