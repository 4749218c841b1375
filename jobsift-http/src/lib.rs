//! HTTP client shared by every extraction strategy.
//!
//! - Request options: headers, [`Auth`], query params, timeout, retries
//! - Redacts credential headers and key-like query params in every log line
//! - Retries 429/5xx with exponential backoff and `Retry-After` support
//! - JSON ([`HttpClient::get_json`]) and text ([`HttpClient::get_text`]) bodies
//! - Optional *raw* request/response logging via `JOBSIFT_HTTP_RAW=1`
//!
//! A client is either anchored to a base URL (API providers) or unanchored
//! (scraping arbitrary pages), where every path must be absolute.
//!
//! ```no_run
//! # async fn demo() -> Result<(), jobsift_http::HttpError> {
//! let client = jobsift_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/jobs", jobsift_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use jobsift_common::SourceError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "JOBSIFT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_LEN: usize = 500;

const SECRET_HEADERS: &[&str] = &[
    "authorization",
    "authorization-key",
    "x-rapidapi-key",
    "x-api-key",
    "proxy-authorization",
];

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "apikey",
    "app_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_header(name: &str) -> bool {
    SECRET_HEADERS
        .iter()
        .any(|secret| name.eq_ignore_ascii_case(secret))
}

fn is_secret_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_PARAMS.contains(&lower.as_str())
}

/// Header pairs with credential values replaced.
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_query(pairs: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let value = if is_secret_param(k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            ((*k).to_string(), value)
        })
        .collect()
}

/// Best-effort curl line for repro, with secrets redacted and no query string.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    for (name, value) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, value.replace('\'', r"'\''")));
    }
    let mut bare = url.clone();
    bare.set_query(None);
    parts.push(format!("'{}'", bare.as_str()));
    parts.join(" ")
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl From<HttpError> for SourceError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api {
                status, message, ..
            } => SourceError::Status {
                status: status.as_u16(),
                message,
            },
            HttpError::Timeout(_) => SourceError::Timeout,
            HttpError::Network(message) | HttpError::Url(message) | HttpError::Build(message) => {
                SourceError::Transport(message)
            }
            HttpError::Decode(message, snippet) => {
                SourceError::Parse(format!("{message} (body: {snippet})"))
            }
        }
    }
}

fn classify(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(err.to_string())
    } else {
        HttpError::Network(err.to_string())
    }
}

/// Authentication strategies supported by the client.
///
/// ```
/// use jobsift_http::Auth;
///
/// let basic = Auth::Basic { username: "key", password: None };
/// match basic {
///     Auth::Basic { username, .. } => assert_eq!(username, "key"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Authorization: Basic base64(username:password)
    Basic {
        username: &'a str,
        password: Option<&'a str>,
    },
    /// Custom header (e.g. `Authorization-Key`, `X-RapidAPI-Key`)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Basic { .. } => "basic",
            Auth::Header { .. } => "header",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use jobsift_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     auth: Some(Auth::Query {
///         name: "api_key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// Connection-level settings fixed for the lifetime of a client.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub user_agent: Option<String>,
    /// Outbound proxy for every scheme.
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            proxy: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// A decoded successful response.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

struct RawResponse {
    url: Url,
    status: StatusCode,
    bytes: Vec<u8>,
    req_id: String,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    user_agent: Option<String>,
    proxy: Option<String>,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use jobsift_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Self::build(Some(base), ClientOptions::default())
    }

    /// A client with no base URL; every request path must be absolute.
    pub fn unanchored(options: ClientOptions) -> Result<Self, HttpError> {
        Self::build(None, options)
    }

    /// Anchored client with explicit connection options.
    pub fn with_options(base: &str, options: ClientOptions) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Self::build(Some(base), options)
    }

    fn build(base: Option<Url>, options: ClientOptions) -> Result<Self, HttpError> {
        let mut builder = Client::builder().connect_timeout(options.connect_timeout);
        if let Some(ua) = &options.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| HttpError::Build(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            user_agent: options.user_agent,
            proxy: options.proxy,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let raw = self.send(Method::GET, path, opts).await?;
        serde_json::from_slice::<T>(&raw.bytes).map_err(|e| {
            let snippet = snip_body(&raw.bytes);
            tracing::warn!(
                req_id=%raw.req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e,
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// GET a body as text (HTML pages, XML feeds).
    pub async fn get_text(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError> {
        let raw = self.send(Method::GET, path, opts).await?;
        Ok(TextResponse {
            url: raw.url,
            status: raw.status,
            body: String::from_utf8_lossy(&raw.bytes).into_owned(),
        })
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        match &self.base {
            None => Url::parse(path).map_err(|e| HttpError::Url(format!("{path}: {e}"))),
            Some(base) => {
                if allow_absolute {
                    if let Ok(abs) = Url::parse(path) {
                        return Ok(abs);
                    }
                }
                base.join(path).map_err(|e| HttpError::Url(e.to_string()))
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        mut opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;

        // Query-param auth is folded into the query once so retries reuse it.
        if let Some(Auth::Query { name, value }) = &opts.auth {
            opts.query
                .get_or_insert_with(Vec::new)
                .push((*name, value.clone()));
        }

        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let auth_kind = opts.auth.as_ref().map(Auth::kind).unwrap_or("none");
        let redacted_q = opts.query.as_deref().map(redact_query).unwrap_or_default();

        loop {
            let mut rb = self.inner.request(method.clone(), url.clone()).timeout(timeout);

            if let Some(q) = &opts.query {
                let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                rb = rb.query(&pairs);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            match &opts.auth {
                Some(Auth::Bearer(tok)) => {
                    rb = rb.bearer_auth(sanitize_api_key(tok)?);
                }
                Some(Auth::Basic { username, password }) => {
                    rb = rb.basic_auth(sanitize_api_key(username)?, *password);
                }
                Some(Auth::Header { name, value }) => {
                    rb = rb.header(name, value);
                }
                Some(Auth::Query { .. }) | Some(Auth::None) | None => {}
            }

            let req_id = format!("r{:06}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));
            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind,
                proxied=self.proxy.is_some(),
                "http.request.start"
            );

            if raw_enabled() {
                let mut merged = HeaderMap::new();
                if let Some(ua) = &self.user_agent {
                    if let Ok(v) = HeaderValue::from_str(ua) {
                        merged.insert(USER_AGENT, v);
                    }
                }
                if let Some(h) = &opts.headers {
                    for (k, v) in h.iter() {
                        merged.append(k, v.clone());
                    }
                }
                let curl = make_curl(&method, &url, &merged);
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let t0 = std::time::Instant::now();
            let outcome = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    let final_url = resp.url().clone();
                    resp.bytes()
                        .await
                        .map(|b| (status, headers, final_url, b.to_vec()))
                        .map_err(|e| ("http.retrying.network_body", e))
                }
                Err(e) => Err(("http.retrying.network_send", e)),
            };

            let (status, headers, final_url, bytes) = match outcome {
                Ok(parts) => parts,
                Err((event, err)) => {
                    let err = classify(err);
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%err,
                            event,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, max_retries, message=%err, "http.network_error");
                    return Err(err);
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let req_hdr_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            let remain = headers
                .get("x-ratelimit-remaining")
                .or_else(|| headers.get("x-rate-limit-remaining"))
                .and_then(|v| v.to_str().ok());

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%req_hdr_id,
                rate_limit.remaining=?remain,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            if status.is_success() {
                return Ok(RawResponse {
                    url: final_url,
                    status,
                    bytes,
                    req_id,
                });
            }

            let snippet = snip_body(&bytes);
            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;

            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let retry_after = retry_after_delay_secs(&headers);
                let delay = match retry_after {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    retry_after_secs=?retry_after,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%req_hdr_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: req_hdr_id,
            });
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // {"message":"..."} / {"detail":"..."} / {"error":"..."} / {"Message":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default, rename = "Message")]
        message_pascal: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(nested) = serde_json::from_slice::<Nested>(body) {
        return nested.error.message;
    }
    if let Ok(flat) = serde_json::from_slice::<Flat>(body) {
        for candidate in [flat.message, flat.message_pascal, flat.detail, flat.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_LEN {
        return text.into_owned();
    }
    let mut end = SNIPPET_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn secrets_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization-key", HeaderValue::from_static("secret"));
        headers.insert("x-rapidapi-key", HeaderValue::from_static("secret"));
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let redacted = redact_headers(&headers);
        assert!(redacted.iter().all(|(k, v)| k == "accept" || v == "<redacted>"));

        let query = redact_query(&[("apikey", "secret".into()), ("q", "rust".into())]);
        assert_eq!(query[0].1, "<redacted>");
        assert_eq!(query[1].1, "rust");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_LEN + 3);
    }

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key(" \"ab c\n\" ").unwrap(), "abc");
        assert!(sanitize_api_key("ключ").is_err());
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(extract_error_message(br#"{"error":{"message":"nested"}}"#), "nested");
        assert_eq!(extract_error_message(br#"{"Message":"pascal"}"#), "pascal");
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn http_errors_map_to_source_errors() {
        let api = HttpError::Api {
            status: StatusCode::BAD_GATEWAY,
            message: "down".into(),
            request_id: "-".into(),
        };
        assert!(matches!(
            SourceError::from(api),
            SourceError::Status { status: 502, .. }
        ));
        assert!(matches!(
            SourceError::from(HttpError::Timeout("slow".into())),
            SourceError::Timeout
        ));
        assert!(matches!(
            SourceError::from(HttpError::Decode("bad".into(), "{".into())),
            SourceError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn basic_auth_and_query_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/1.0/search"))
            .and(query_param("keywords", "rust"))
            .and(header("authorization", "Basic a2V5Og=="))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let body: serde_json::Value = client
            .get_json(
                "/api/1.0/search",
                RequestOpts {
                    auth: Some(Auth::Basic {
                        username: "key",
                        password: Some(""),
                    }),
                    query: Some(vec![("keywords", "rust".into())]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = HttpClient::unanchored(ClientOptions::default()).unwrap();
        let resp = client
            .get_text(&format!("{}/flaky", server.uri()), RequestOpts::default())
            .await
            .unwrap();
        assert_eq!(resp.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"no such job"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<serde_json::Value>("/missing", RequestOpts::default())
            .await
            .unwrap_err();
        match err {
            HttpError::Api { status, message, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "no such job");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(50))
            .with_retries(0);
        let err = client
            .get_text("/slow", RequestOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn unanchored_client_rejects_relative_paths() {
        let client = HttpClient::unanchored(ClientOptions::default()).unwrap();
        assert!(matches!(client.resolve("/jobs", false), Err(HttpError::Url(_))));
    }
}
