use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use jobsift_common::{relevance, CanonicalQuery, JobPosting, JobsiftError, RawPosting, SourceError};
use jobsift_config::{GlobalSettings, JobsiftConfig, SourceDescriptor, SourceKind};
use jobsift_providers::{build_provider, ProviderQuery};
use jobsift_web::{FantocciniRenderer, FeedExtractor, MarkupExtractor};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::identity::IdentityManager;
use crate::rate::RateManager;
use crate::registry::ProviderRegistry;

/// Dispatch stage a source ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Api,
    Markup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Api => f.write_str("api"),
            Phase::Markup => f.write_str("markup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Valid postings contributed, before dedup.
    Jobs(usize),
    Failed(String),
}

/// Per-source report of one run.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub phase: Phase,
    pub status: OutcomeStatus,
    pub elapsed: Duration,
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Merged, scored, deduplicated postings plus one outcome per source.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub postings: Vec<JobPosting>,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunResult {
    /// `"<source>: <error>"` for every failed source.
    pub fn diagnostics(&self) -> Vec<String> {
        diagnostics(&self.outcomes)
    }
}

fn diagnostics(outcomes: &[SourceOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| match &o.status {
            OutcomeStatus::Failed(message) => Some(format!("{}: {message}", o.source)),
            OutcomeStatus::Jobs(_) => None,
        })
        .collect()
}

struct TaskReport {
    source: String,
    phase: Phase,
    elapsed: Duration,
    /// Keyword set the postings are scored against.
    keywords: Vec<String>,
    outcome: Result<Vec<RawPosting>, String>,
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}

fn describe(err: &SourceError) -> String {
    match err {
        SourceError::Cancelled => "run timeout exceeded".to_string(),
        other => other.to_string(),
    }
}

/// Spawn one isolated source task. Panics and cancellation become failed
/// reports; nothing escapes into sibling tasks.
fn spawn_source<F>(
    set: &mut JoinSet<TaskReport>,
    source: String,
    phase: Phase,
    keywords: Vec<String>,
    cancel: CancellationToken,
    work: F,
) where
    F: Future<Output = Result<Vec<RawPosting>, SourceError>> + Send + 'static,
{
    set.spawn(async move {
        let started = Instant::now();
        let guarded = AssertUnwindSafe(work).catch_unwind();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(describe(&SourceError::Cancelled)),
            result = guarded => match result {
                Ok(Ok(postings)) => Ok(postings),
                Ok(Err(err)) => Err(describe(&err)),
                Err(panic) => Err(panic_message(panic)),
            },
        };
        TaskReport {
            source,
            phase,
            elapsed: started.elapsed(),
            keywords,
            outcome,
        }
    });
}

/// Drain a phase's tasks. When the run deadline passes the token is
/// cancelled and the remaining tasks report as timed out.
async fn collect(
    mut set: JoinSet<TaskReport>,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Vec<TaskReport> {
    let mut reports = Vec::with_capacity(set.len());
    loop {
        let next = if cancel.is_cancelled() {
            set.join_next().await
        } else {
            match timeout_at(deadline, set.join_next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::warn!(pending = set.len(), "engine.run.timeout");
                    cancel.cancel();
                    continue;
                }
            }
        };
        match next {
            None => break,
            Some(Ok(report)) => reports.push(report),
            Some(Err(e)) => tracing::error!(error = %e, "engine.task.join_failed"),
        }
    }
    reports
}

/// Fans one canonical query out over every configured provider, then every
/// enabled markup/feed source, and merges what comes back.
///
/// Each instance owns its pacing state and provider statistics.
pub struct Aggregator {
    global: GlobalSettings,
    sources: Vec<SourceDescriptor>,
    registry: Arc<ProviderRegistry>,
    rate: Arc<RateManager>,
    identity: Arc<IdentityManager>,
    markup: MarkupExtractor,
    feed: FeedExtractor,
}

impl Aggregator {
    pub fn new(
        global: GlobalSettings,
        sources: Vec<SourceDescriptor>,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            rate: Arc::new(RateManager::new(&global)),
            identity: Arc::new(IdentityManager::new(&global)),
            registry: Arc::new(registry),
            markup: MarkupExtractor::new(),
            feed: FeedExtractor::new(),
            sources: sources.into_iter().filter(|s| s.enabled).collect(),
            global,
        }
    }

    /// Build from a loaded configuration: providers are constructed and
    /// registered, the browser renderer is attached when enabled, and an
    /// enabled proxy pool is health-checked before the first run.
    pub async fn from_config(config: &JobsiftConfig) -> Result<Self, JobsiftError> {
        let registry = ProviderRegistry::new();
        for provider_config in config.enabled_providers() {
            match build_provider(&provider_config, &config.global) {
                Ok(provider) => registry
                    .register(provider)
                    .await
                    .map_err(|e| JobsiftError::Config(e.to_string()))?,
                Err(e) => tracing::warn!(
                    provider = %provider_config.name,
                    error = %e,
                    "provider.skipped"
                ),
            }
        }

        let mut markup = MarkupExtractor::new();
        if config.global.browser.enabled {
            let renderer = FantocciniRenderer::from_settings(
                &config.global.browser,
                Duration::from_millis(config.global.timeout_ms),
            );
            markup = markup.with_renderer(Arc::new(renderer));
        }

        let aggregator =
            Self::new(config.global.clone(), config.enabled_sources(), registry).with_markup(markup);

        let proxies = aggregator.identity.proxies();
        if config.global.proxy.enabled
            && !proxies.is_empty().await
            && proxies.check_health().await == 0
        {
            tracing::warn!("proxy.pool.empty");
        }
        Ok(aggregator)
    }

    pub fn with_markup(mut self, markup: MarkupExtractor) -> Self {
        self.markup = markup;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &IdentityManager {
        &self.identity
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Run both phases and merge.
    ///
    /// Fails only when no posting survived and at least one source failed.
    pub async fn run(&self, query: &CanonicalQuery) -> Result<RunResult, JobsiftError> {
        if query.is_empty() {
            return Err(JobsiftError::Config("query has no keywords".into()));
        }

        let cancel = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_secs(self.global.run_timeout_secs.max(1));
        let started = Instant::now();

        let mut reports = self.api_phase(query, deadline, &cancel).await;
        reports.extend(self.markup_phase(query, deadline, &cancel).await);

        let result = merge(reports);
        tracing::info!(
            jobs = result.postings.len(),
            sources = result.outcomes.len(),
            failed = result.outcomes.iter().filter(|o| o.is_failure()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine.run.complete"
        );

        if result.postings.is_empty() {
            let diagnostics = result.diagnostics();
            if !diagnostics.is_empty() {
                return Err(JobsiftError::AllSourcesFailed(diagnostics.join("; ")));
            }
        }
        Ok(result)
    }

    async fn api_phase(
        &self,
        query: &CanonicalQuery,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Vec<TaskReport> {
        let providers = self.registry.configured();
        if providers.is_empty() {
            tracing::debug!("engine.phase.api.skipped");
            return Vec::new();
        }

        tracing::info!(providers = providers.len(), "engine.phase.start");
        let mut set = JoinSet::new();
        for provider in providers {
            let registry = self.registry.clone();
            let provider_query = ProviderQuery::from_canonical(query, 0);
            let name = provider.name().to_string();
            spawn_source(
                &mut set,
                name,
                Phase::Api,
                query.keywords.clone(),
                cancel.clone(),
                async move {
                    let cooldown = provider.rate_limit().cooldown;
                    if !cooldown.is_zero() {
                        tokio::time::sleep(cooldown).await;
                    }
                    registry
                        .search_with(provider.as_ref(), &provider_query)
                        .await
                        .map(|page| page.postings)
                },
            );
        }
        let reports = collect(set, deadline, cancel).await;
        tracing::info!(phase = %Phase::Api, reports = reports.len(), "engine.phase.complete");
        reports
    }

    async fn markup_phase(
        &self,
        query: &CanonicalQuery,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Vec<TaskReport> {
        if self.sources.is_empty() {
            return Vec::new();
        }

        tracing::info!(sources = self.sources.len(), "engine.phase.start");
        let mut set = JoinSet::new();
        for descriptor in &self.sources {
            let keywords = match &descriptor.kind {
                SourceKind::Feed { config } => query.keywords_with(&config.keywords),
                SourceKind::Scrape { .. } => query.keywords.clone(),
            };
            let work = source_work(
                descriptor.clone(),
                query.clone(),
                descriptor.result_cap(&self.global),
                self.rate.clone(),
                self.identity.clone(),
                self.markup.clone(),
                self.feed,
                cancel.clone(),
            );
            spawn_source(
                &mut set,
                descriptor.name.clone(),
                Phase::Markup,
                keywords,
                cancel.clone(),
                work,
            );
        }
        let reports = collect(set, deadline, cancel).await;
        tracing::info!(phase = %Phase::Markup, reports = reports.len(), "engine.phase.complete");
        reports
    }
}

#[allow(clippy::too_many_arguments)]
async fn source_work(
    descriptor: SourceDescriptor,
    query: CanonicalQuery,
    cap: usize,
    rate: Arc<RateManager>,
    identity: Arc<IdentityManager>,
    markup: MarkupExtractor,
    feed: FeedExtractor,
    cancel: CancellationToken,
) -> Result<Vec<RawPosting>, SourceError> {
    rate.before_request(descriptor.endpoint(), descriptor.rate_limit_ms, &cancel)
        .await?;
    let lease = identity.lease().await?;

    let result = match &descriptor.kind {
        SourceKind::Scrape { config } => {
            markup
                .extract(&descriptor.name, config, &query, &lease.client, cap)
                .await
        }
        SourceKind::Feed { config } => {
            feed.extract(&descriptor.name, config, &query, &lease.client, cap)
                .await
        }
    };

    if let (Err(SourceError::Transport(_)), Some(proxy)) = (&result, &lease.proxy) {
        identity.proxies().mark_bad(proxy).await;
    }
    result
}

/// Validate, score and dedup in report order: API phase first, then
/// markup/feed, each in arrival order.
fn merge(reports: Vec<TaskReport>) -> RunResult {
    let mut collected = Vec::new();
    let mut outcomes = Vec::with_capacity(reports.len());

    for report in reports {
        let status = match report.outcome {
            Ok(raw) => {
                let before = collected.len();
                collected.extend(raw.into_iter().filter_map(RawPosting::into_posting).map(
                    |mut posting| {
                        posting.score(&report.keywords);
                        posting
                    },
                ));
                let jobs = collected.len() - before;
                tracing::info!(
                    source = %report.source,
                    phase = %report.phase,
                    jobs,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "source.complete"
                );
                OutcomeStatus::Jobs(jobs)
            }
            Err(message) => {
                tracing::warn!(
                    source = %report.source,
                    phase = %report.phase,
                    error = %message,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "source.failed"
                );
                OutcomeStatus::Failed(message)
            }
        };
        outcomes.push(SourceOutcome {
            source: report.source,
            phase: report.phase,
            status,
            elapsed: report.elapsed,
        });
    }

    let before = collected.len();
    let postings = relevance::dedup(collected);
    tracing::debug!(
        before,
        after = postings.len(),
        "engine.merge.dedup"
    );
    RunResult { postings, outcomes }
}
