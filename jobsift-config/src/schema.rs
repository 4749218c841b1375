//! Typed shape of the source configuration document.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsiftConfig {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub global: GlobalSettings,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub api_providers: Vec<ApiProviderConfig>,
}

impl JobsiftConfig {
    /// Snapshot of the enabled source descriptors, in document order.
    pub fn enabled_sources(&self) -> Vec<SourceDescriptor> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }

    /// Snapshot of the enabled API provider configs, in document order.
    pub fn enabled_providers(&self) -> Vec<ApiProviderConfig> {
        self.api_providers
            .iter()
            .filter(|p| p.enabled)
            .cloned()
            .collect()
    }

    /// Copy with every credential masked, safe to log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for key in copy.global.api_keys.values_mut() {
            *key = mask(key);
        }
        for provider in &mut copy.api_providers {
            provider.api_key = mask(&provider.api_key);
        }
        copy
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "***".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub default_location: String,
    /// Cap applied to sources without their own `max_results`.
    pub max_results_per_source: usize,
    pub user_agent: String,
    /// Per network call.
    pub timeout_ms: u64,
    /// Whole-run budget.
    pub run_timeout_secs: u64,
    pub retry_attempts: u32,
    pub delay: DelaySettings,
    pub export_formats: Vec<String>,
    pub export_path: PathBuf,
    pub api_keys: BTreeMap<String, String>,
    pub proxy: ProxySettings,
    pub browser: BrowserSettings,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_location: "Remote".into(),
            max_results_per_source: 50,
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_ms: 30_000,
            run_timeout_secs: 300,
            retry_attempts: 2,
            delay: DelaySettings::default(),
            export_formats: vec!["csv".into()],
            export_path: PathBuf::from("exports"),
            api_keys: BTreeMap::new(),
            proxy: ProxySettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

/// Jitter window injected before each markup/feed request. `min_ms` doubles as
/// the global pacing interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub enabled: bool,
    pub proxies: Vec<String>,
    /// Leases served before moving to the next proxy.
    pub rotate_every: u32,
    pub timeout_secs: u64,
    pub health_check_url: String,
    pub rotate_user_agents: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            proxies: Vec::new(),
            rotate_every: 10,
            timeout_secs: 10,
            health_check_url: "http://httpbin.org/ip".into(),
            rotate_user_agents: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub enabled: bool,
    pub webdriver_url: String,
    pub headless: bool,
    /// Wait after navigation before selectors are evaluated.
    pub settle_ms: u64,
    pub stealth: StealthLevel,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            settle_ms: 2000,
            stealth: StealthLevel::default(),
        }
    }
}

/// One markup or feed source. Shared fields plus the per-kind payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum spacing between requests to this source's host.
    #[serde(default)]
    pub rate_limit_ms: u64,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(flatten)]
    pub kind: SourceKind,
}

impl SourceDescriptor {
    pub fn endpoint(&self) -> &str {
        match &self.kind {
            SourceKind::Scrape { config } => &config.base_url,
            SourceKind::Feed { config } => &config.feed_url,
        }
    }

    /// The source's own cap, else the global per-board cap.
    pub fn result_cap(&self, global: &GlobalSettings) -> usize {
        self.max_results
            .filter(|n| *n > 0)
            .unwrap_or(global.max_results_per_source)
    }
}

/// The tag is `kind`; the payload lives in `config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceKind {
    Scrape { config: ScrapeConfig },
    Feed { config: FeedConfig },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub base_url: String,
    #[serde(default)]
    pub search_path: String,
    /// Query parameters in order; values may hold `{keywords}` and `{location}`.
    #[serde(default)]
    pub search_params: Vec<SearchParam>,
    #[serde(default)]
    pub render: RenderMode,
    pub selectors: SelectorMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParam {
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Browser only when the name or URL looks client-rendered.
    #[default]
    Auto,
    Static,
    Browser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorMap {
    pub job_container: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub link: String,
    pub title_fallback: Vec<String>,
    pub company_fallback: Vec<String>,
    pub location_fallback: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    #[default]
    Rss,
    Atom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub feed_url: String,
    #[serde(default)]
    pub feed_type: FeedType,
    /// Merged with the query keywords for filtering and scoring.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_words: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Reed,
    Usajobs,
    Jsearch,
    Generic,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Reed => "reed",
            ProviderKind::Usajobs => "usajobs",
            ProviderKind::Jsearch => "jsearch",
            ProviderKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProviderConfig {
    pub name: String,
    pub provider: ProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_key: String,
    /// Provider default when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_max_results")]
    pub max_results: usize,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub generic: Option<GenericApiConfig>,
}

impl ApiProviderConfig {
    /// Environment variable that overrides this provider's key.
    ///
    /// Typed providers use their provider id; generic ones use their name.
    ///
    /// ```
    /// use jobsift_config::{ApiProviderConfig, ProviderKind};
    ///
    /// let reed = ApiProviderConfig::new("reed-uk", ProviderKind::Reed);
    /// assert_eq!(reed.api_key_env(), "REED_API_KEY");
    ///
    /// let custom = ApiProviderConfig::new("acme-jobs", ProviderKind::Generic);
    /// assert_eq!(custom.api_key_env(), "ACME_JOBS_API_KEY");
    /// ```
    pub fn api_key_env(&self) -> String {
        let stem = match self.provider {
            ProviderKind::Generic => self.name.as_str(),
            other => other.id(),
        };
        let stem: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}_API_KEY")
    }

    /// Minimal config with defaults for everything but name and provider.
    pub fn new(name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            name: name.into(),
            provider,
            enabled: true,
            api_key: String::new(),
            base_url: None,
            max_results: default_api_max_results(),
            timeout_secs: default_api_timeout(),
            rate_limit: RateLimitConfig::default(),
            headers: BTreeMap::new(),
            generic: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub requests_per_day: u32,
    /// Wait applied before every call to the provider.
    pub cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 0,
            requests_per_day: 0,
            cooldown_ms: 1000,
        }
    }
}

/// Field map for an API whose response shape is only known at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericApiConfig {
    /// Path appended to `base_url`.
    pub search_path: String,
    /// JSON pointer to the array of postings; empty means the root.
    pub results_pointer: String,
    pub total_pointer: Option<String>,
    pub fields: GenericFieldMap,
    pub keywords_param: Option<String>,
    pub location_param: Option<String>,
    pub limit_param: Option<String>,
    pub offset_param: Option<String>,
    pub auth: AuthStyle,
}

/// JSON pointers relative to one result object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericFieldMap {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub external_id: Option<String>,
    pub posted_at: Option<String>,
}

/// How a generic provider presents its key: `none`, `bearer`, `basic`,
/// `header:<name>` or `query:<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthStyle {
    #[default]
    None,
    Bearer,
    Basic,
    Header(String),
    Query(String),
}

impl TryFrom<String> for AuthStyle {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        match trimmed.split_once(':') {
            Some(("header", name)) if !name.trim().is_empty() => {
                Ok(AuthStyle::Header(name.trim().to_string()))
            }
            Some(("query", name)) if !name.trim().is_empty() => {
                Ok(AuthStyle::Query(name.trim().to_string()))
            }
            _ => match trimmed {
                "" | "none" => Ok(AuthStyle::None),
                "bearer" => Ok(AuthStyle::Bearer),
                "basic" => Ok(AuthStyle::Basic),
                other => Err(format!("unknown auth style `{other}`")),
            },
        }
    }
}

impl From<AuthStyle> for String {
    fn from(style: AuthStyle) -> Self {
        match style {
            AuthStyle::None => "none".into(),
            AuthStyle::Bearer => "bearer".into(),
            AuthStyle::Basic => "basic".into(),
            AuthStyle::Header(name) => format!("header:{name}"),
            AuthStyle::Query(name) => format!("query:{name}"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_max_results() -> usize {
    100
}

fn default_api_timeout() -> u64 {
    30
}

/// Accepts scalars of any type as a string. Unquoted YAML such as `version: 1`
/// or a numeric key parsed from the environment arrives as a number.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "lenient_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_style_parses_all_forms() {
        let cases = [
            ("none", AuthStyle::None),
            ("bearer", AuthStyle::Bearer),
            ("basic", AuthStyle::Basic),
            ("header:X-Api-Key", AuthStyle::Header("X-Api-Key".into())),
            ("query:api_key", AuthStyle::Query("api_key".into())),
        ];
        for (raw, expected) in cases {
            assert_eq!(AuthStyle::try_from(raw.to_string()), Ok(expected));
        }
        assert!(AuthStyle::try_from("header:".to_string()).is_err());
        assert!(AuthStyle::try_from("cookie".to_string()).is_err());
    }

    #[test]
    fn result_cap_falls_back_to_global() {
        let global = GlobalSettings::default();
        let source: SourceDescriptor = serde_json::from_value(serde_json::json!({
            "name": "feed",
            "kind": "feed",
            "config": { "feed_url": "https://example.com/rss" }
        }))
        .expect("descriptor");

        assert!(source.enabled);
        assert_eq!(source.result_cap(&global), 50);
        assert_eq!(source.endpoint(), "https://example.com/rss");
    }

    #[test]
    fn redacted_masks_every_key() {
        let mut config = JobsiftConfig::default();
        config.global.api_keys.insert("reed".into(), "secret".into());
        let mut provider = ApiProviderConfig::new("reed", ProviderKind::Reed);
        provider.api_key = "secret".into();
        config.api_providers.push(provider);

        let redacted = config.redacted();
        assert_eq!(redacted.global.api_keys["reed"], "***");
        assert_eq!(redacted.api_providers[0].api_key, "***");
    }
}
