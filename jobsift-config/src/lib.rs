//! Loader for the source configuration document.
//!
//! Sources are merged in the order they are attached, then the `JOBSIFT_`
//! environment overlay is applied on top (`JOBSIFT_GLOBAL__TIMEOUT_MS=5000`
//! sets `global.timeout_ms`). Every string value then has `${VAR}` / `$VAR`
//! placeholders expanded, API keys are resolved from `<PROVIDER>_API_KEY`
//! variables or `global.api_keys`, and the result is validated before it is
//! handed out.
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::path::Path;

mod schema;
mod validate;

pub use schema::{
    ApiProviderConfig, AuthStyle, BrowserSettings, DelaySettings, FeedConfig, FeedType,
    GenericApiConfig, GenericFieldMap, GlobalSettings, JobsiftConfig, ProviderKind, ProxySettings,
    RateLimitConfig, RenderMode, ScrapeConfig, SearchParam, SelectorMap, SourceDescriptor,
    SourceKind, StealthLevel,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "JOBSIFT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

impl JobsiftConfig {
    /// YAML rendering of the redacted config, for diagnostics.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigLoadError> {
        serde_yaml::to_string(&self.redacted()).map_err(|e| ConfigLoadError::Render(e.to_string()))
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// True when `s` still holds a `$VAR` or `${VAR}` that expansion left behind.
fn has_unexpanded_var(s: &str) -> bool {
    s.match_indices('$').any(|(i, _)| {
        s[i + 1..]
            .chars()
            .next()
            .is_some_and(|c| c == '{' || c == '_' || c.is_ascii_alphabetic())
    })
}

/// A non-empty `<PROVIDER>_API_KEY` wins; otherwise an empty key falls back to
/// `global.api_keys[<provider id>]`, then `global.api_keys[<name>]`. A key still
/// holding an unset placeholder counts as empty.
fn resolve_api_keys(config: &mut JobsiftConfig) {
    let global_keys = &config.global.api_keys;
    for provider in &mut config.api_providers {
        if has_unexpanded_var(&provider.api_key) {
            provider.api_key.clear();
        }
        if let Ok(key) = std::env::var(provider.api_key_env()) {
            if !key.trim().is_empty() {
                provider.api_key = key.trim().to_string();
                continue;
            }
        }
        if provider.api_key.trim().is_empty() {
            if let Some(key) = global_keys
                .get(provider.provider.id())
                .or_else(|| global_keys.get(&provider.name))
            {
                if !has_unexpanded_var(key) {
                    provider.api_key = key.clone();
                }
            }
        }
        provider.api_key = provider.api_key.trim().to_string();
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct JobsiftConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for JobsiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl JobsiftConfigLoader {
    /// An empty loader; with nothing attached, `load` yields the defaults plus
    /// any `JOBSIFT_` overrides.
    ///
    /// ```
    /// use jobsift_config::JobsiftConfigLoader;
    ///
    /// let config = JobsiftConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nsources: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.sources.is_empty());
    /// assert_eq!(config.global.default_location, "Remote");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use jobsift_config::{JobsiftConfigLoader, SourceKind};
    ///
    /// let cfg = JobsiftConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// sources:
    ///   - name: "remote-feed"
    ///     kind: "feed"
    ///     config:
    ///       feed_url: "https://example.com/jobs.rss"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.sources.len(), 1);
    /// assert!(matches!(cfg.sources[0].kind, SourceKind::Feed { .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and produce a validated [`JobsiftConfig`].
    pub fn load(self) -> Result<JobsiftConfig, ConfigLoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: JobsiftConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        resolve_api_keys(&mut typed);
        validate::validate(&typed)?;

        Ok(typed)
    }
}
