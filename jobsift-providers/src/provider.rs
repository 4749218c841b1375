use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use jobsift_common::SourceError;
use jobsift_config::{ApiProviderConfig, GlobalSettings, RateLimitConfig};
use jobsift_http::{Auth, ClientOptions, HttpClient, RequestOpts};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::query::{ProviderQuery, SearchPage};

/// Pacing contract a provider advertises. Zero means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderRateLimit {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub requests_per_day: u32,
    /// Minimum wait before each call.
    pub cooldown: Duration,
}

impl From<&RateLimitConfig> for ProviderRateLimit {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            requests_per_minute: config.requests_per_minute,
            requests_per_hour: config.requests_per_hour,
            requests_per_day: config.requests_per_day,
            cooldown: Duration::from_millis(config.cooldown_ms),
        }
    }
}

/// A structured job-search API.
///
/// Implementations are independent of each other; the engine only sees this
/// trait.
#[async_trait]
pub trait JobApiProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Enabled and holding a credential. Unconfigured providers are never
    /// dispatched.
    fn is_configured(&self) -> bool;

    fn rate_limit(&self) -> ProviderRateLimit;

    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, SourceError>;

    /// Minimal live search confirming the credential works.
    async fn validate_credentials(&self) -> Result<(), SourceError>;
}

/// What a typed adapter hands to [`ApiProvider`] for one call.
pub struct ProviderRequest<'a> {
    /// Appended to the endpoint when non-empty.
    pub path: Cow<'a, str>,
    pub query: Vec<(&'a str, Cow<'a, str>)>,
    pub auth: Auth<'a>,
    pub headers: HeaderMap,
}

impl<'a> ProviderRequest<'a> {
    pub fn new(auth: Auth<'a>) -> Self {
        Self {
            path: Cow::Borrowed(""),
            query: Vec::new(),
            auth,
            headers: HeaderMap::new(),
        }
    }

    pub fn param(&mut self, name: &'a str, value: impl Into<Cow<'a, str>>) -> &mut Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn header(&mut self, name: &'static str, value: &str) -> Result<&mut Self, SourceError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| SourceError::NotConfigured(format!("invalid {name} header: {e}")))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }
}

/// Request shaping and response mapping for one API.
pub trait ApiSchema: Send + Sync {
    type Response: DeserializeOwned + Send;

    fn id(&self) -> &'static str;

    /// Full search endpoint used when the config leaves `base_url` unset.
    fn default_endpoint(&self) -> &'static str;

    fn request<'a>(
        &'a self,
        query: &ProviderQuery,
        api_key: &'a str,
        endpoint: &str,
    ) -> Result<ProviderRequest<'a>, SourceError>;

    fn parse(
        &self,
        response: Self::Response,
        query: &ProviderQuery,
        source: &str,
    ) -> Result<SearchPage, SourceError>;

    fn probe_query(&self) -> ProviderQuery;
}

/// Drives an [`ApiSchema`] over the shared HTTP client.
pub struct ApiProvider<S> {
    schema: S,
    config: ApiProviderConfig,
    endpoint: String,
    headers: HeaderMap,
    http: HttpClient,
}

impl<S> fmt::Debug for ApiProvider<S>
where
    S: ApiSchema,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiProvider")
            .field("name", &self.config.name)
            .field("provider", &self.schema.id())
            .field("endpoint", &self.endpoint)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl<S: ApiSchema> ApiProvider<S> {
    pub fn new(
        schema: S,
        config: ApiProviderConfig,
        global: &GlobalSettings,
    ) -> Result<Self, SourceError> {
        let endpoint = config
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| schema.default_endpoint().to_string());

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SourceError::NotConfigured(format!("{}: invalid header `{name}`: {e}", config.name))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SourceError::NotConfigured(format!("{}: invalid value for `{name}`: {e}", config.name))
            })?;
            headers.insert(name, value);
        }

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| Some(global.user_agent.clone()).filter(|ua| !ua.is_empty()));

        let http = HttpClient::unanchored(ClientOptions {
            user_agent,
            ..ClientOptions::default()
        })?
        .with_timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .with_retries(global.retry_attempts as usize);

        Ok(Self {
            schema,
            config,
            endpoint,
            headers,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Caller limit clamped to the provider's `max_results`; zero means "as
    /// many as allowed".
    fn bounded(&self, query: &ProviderQuery) -> ProviderQuery {
        let cap = self.config.max_results.max(1);
        let mut bounded = query.clone();
        bounded.limit = match query.limit {
            0 => cap,
            n => n.min(cap),
        };
        bounded
    }
}

fn join_endpoint(endpoint: &str, path: &str) -> String {
    if path.is_empty() {
        return endpoint.to_string();
    }
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl<S: ApiSchema> JobApiProvider for ApiProvider<S> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        self.config.enabled && !self.config.api_key.trim().is_empty()
    }

    fn rate_limit(&self) -> ProviderRateLimit {
        ProviderRateLimit::from(&self.config.rate_limit)
    }

    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::NotConfigured(format!(
                "{} provider `{}` has no api key or is disabled",
                self.schema.id(),
                self.config.name
            )));
        }

        let query = self.bounded(query);
        let request = self
            .schema
            .request(&query, &self.config.api_key, &self.endpoint)?;

        let mut headers = self.headers.clone();
        headers.extend(request.headers);
        let url = join_endpoint(&self.endpoint, &request.path);

        tracing::debug!(
            provider = %self.config.name,
            kind = self.schema.id(),
            limit = query.limit,
            offset = query.offset,
            "provider.search.start"
        );

        let response: S::Response = self
            .http
            .get_json(
                &url,
                RequestOpts {
                    auth: Some(request.auth),
                    headers: Some(headers),
                    query: Some(request.query),
                    ..Default::default()
                },
            )
            .await?;

        let page = self.schema.parse(response, &query, &self.config.name)?;
        tracing::debug!(
            provider = %self.config.name,
            jobs = page.postings.len(),
            total = page.total,
            has_more = page.has_more,
            "provider.search.complete"
        );
        Ok(page)
    }

    async fn validate_credentials(&self) -> Result<(), SourceError> {
        self.search(&self.schema.probe_query()).await.map(|_| ())
    }
}
