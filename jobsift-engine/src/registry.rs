use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use jobsift_common::SourceError;
use jobsift_providers::{JobApiProvider, ProviderQuery, SearchPage};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("provider `{0}` is already registered")]
    Duplicate(String),

    #[error("provider `{0}` not found")]
    NotFound(String),

    #[error("provider `{0}` is not configured")]
    NotConfigured(String),

    #[error("provider `{name}` failed: {error}")]
    Search { name: String, error: SourceError },
}

/// Running counters for one provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_jobs: u64,
    pub average_latency: Duration,
    pub last_used: Option<DateTime<Utc>>,
}

impl ProviderStats {
    fn record(&mut self, latency: Duration, jobs: Option<usize>) {
        self.total_requests += 1;
        match jobs {
            Some(n) => {
                self.successful_requests += 1;
                self.total_jobs += n as u64;
            }
            None => self.failed_requests += 1,
        }
        // Running mean over every call, successful or not.
        let n = self.total_requests as u32;
        self.average_latency = (self.average_latency * (n - 1) + latency) / n;
        self.last_used = Some(Utc::now());
    }
}

/// Named structured-API providers plus their statistics.
///
/// Names are unique. Statistics are updated once per call under a write lock;
/// readers take snapshots.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn JobApiProvider>>,
    stats: RwLock<HashMap<String, ProviderStats>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, provider: Arc<dyn JobApiProvider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        match self.providers.entry(name.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::Duplicate(name)),
            Entry::Vacant(slot) => {
                slot.insert(provider);
            }
        }
        self.stats.write().await.insert(name.clone(), ProviderStats::default());
        tracing::debug!(provider = %name, "registry.provider.registered");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn JobApiProvider>> {
        self.providers.get(name).map(|p| p.value().clone())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Providers holding credentials, sorted by name.
    pub fn configured(&self) -> Vec<Arc<dyn JobApiProvider>> {
        let mut configured: Vec<Arc<dyn JobApiProvider>> = self
            .providers
            .iter()
            .filter(|e| e.value().is_configured())
            .map(|e| e.value().clone())
            .collect();
        configured.sort_by(|a, b| a.name().cmp(b.name()));
        configured
    }

    /// One search through `provider`, with the call recorded in the stats.
    pub async fn search_with(
        &self,
        provider: &dyn JobApiProvider,
        query: &ProviderQuery,
    ) -> Result<SearchPage, SourceError> {
        let started = Instant::now();
        let result = provider.search(query).await;
        let latency = started.elapsed();

        let jobs = result.as_ref().ok().map(|page| page.postings.len());
        self.stats
            .write()
            .await
            .entry(provider.name().to_string())
            .or_default()
            .record(latency, jobs);
        result
    }

    pub async fn search_one(
        &self,
        name: &str,
        query: &ProviderQuery,
    ) -> Result<SearchPage, RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if !provider.is_configured() {
            return Err(RegistryError::NotConfigured(name.to_string()));
        }
        self.search_with(provider.as_ref(), query)
            .await
            .map_err(|error| RegistryError::Search {
                name: name.to_string(),
                error,
            })
    }

    /// Search every configured provider concurrently, each after its own
    /// cooldown.
    pub async fn search_all(
        &self,
        query: &ProviderQuery,
    ) -> Vec<(String, Result<SearchPage, SourceError>)> {
        let calls = self.configured().into_iter().map(|provider| async move {
            tokio::time::sleep(provider.rate_limit().cooldown).await;
            let result = self.search_with(provider.as_ref(), query).await;
            (provider.name().to_string(), result)
        });
        join_all(calls).await
    }

    pub async fn stats(&self) -> HashMap<String, ProviderStats> {
        self.stats.read().await.clone()
    }

    /// Probe every provider's credentials concurrently.
    pub async fn validate_all(&self) -> Vec<(String, Result<(), SourceError>)> {
        let providers: Vec<Arc<dyn JobApiProvider>> =
            self.providers.iter().map(|e| e.value().clone()).collect();
        let probes = providers.into_iter().map(|provider| async move {
            let name = provider.name().to_string();
            if !provider.is_configured() {
                let err = SourceError::NotConfigured(format!("{name} has no api key"));
                return (name, Err(err));
            }
            let result = provider.validate_credentials().await;
            (name, result)
        });
        let mut results = join_all(probes).await;
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}
