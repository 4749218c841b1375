//! Config-driven fallback for APIs without a typed adapter.
//!
//! The response is walked as an untyped [`Value`] using JSON pointers from the
//! config. Anything missing or non-scalar becomes an empty string, and the
//! candidate is later dropped by validation if a required field is empty.
use std::borrow::Cow;

use chrono::{DateTime, Utc};
use jobsift_common::{RawPosting, SourceError};
use jobsift_config::{AuthStyle, GenericApiConfig};
use jobsift_http::Auth;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;

use crate::provider::{ApiSchema, ProviderRequest};
use crate::query::{ProviderQuery, SearchPage};

#[derive(Debug, Clone)]
pub struct GenericSchema {
    config: GenericApiConfig,
}

impl GenericSchema {
    pub fn new(config: GenericApiConfig) -> Self {
        Self { config }
    }
}

fn pointer(raw: &str) -> Cow<'_, str> {
    if raw.is_empty() || raw.starts_with('/') {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("/{raw}"))
    }
}

fn text_at(item: &Value, ptr: Option<&str>) -> String {
    let Some(ptr) = ptr.filter(|p| !p.trim().is_empty()) else {
        return String::new();
    };
    match item.pointer(&pointer(ptr.trim())) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

impl ApiSchema for GenericSchema {
    type Response = Value;

    fn id(&self) -> &'static str {
        "generic"
    }

    fn default_endpoint(&self) -> &'static str {
        ""
    }

    fn request<'a>(
        &'a self,
        query: &ProviderQuery,
        api_key: &'a str,
        _endpoint: &str,
    ) -> Result<ProviderRequest<'a>, SourceError> {
        let auth = match &self.config.auth {
            AuthStyle::None => Auth::None,
            AuthStyle::Bearer => Auth::Bearer(api_key),
            AuthStyle::Basic => Auth::Basic {
                username: api_key,
                password: None,
            },
            AuthStyle::Header(name) => Auth::Header {
                name: HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| SourceError::NotConfigured(format!("auth header `{name}`: {e}")))?,
                value: HeaderValue::from_str(api_key.trim())
                    .map_err(|e| SourceError::NotConfigured(format!("api key: {e}")))?,
            },
            AuthStyle::Query(name) => Auth::Query {
                name: name.as_str(),
                value: Cow::Borrowed(api_key.trim()),
            },
        };

        let mut req = ProviderRequest::new(auth);
        req.path = Cow::Borrowed(self.config.search_path.as_str());
        req.header("accept", "application/json")?;

        if let Some(name) = self.config.keywords_param.as_deref() {
            if !query.keywords.is_empty() {
                req.param(name, query.keyword_line());
            }
        }
        if let Some(name) = self.config.location_param.as_deref() {
            if !query.location.is_empty() {
                req.param(name, query.location.clone());
            }
        }
        if let Some(name) = self.config.limit_param.as_deref() {
            req.param(name, query.limit.to_string());
        }
        if let Some(name) = self.config.offset_param.as_deref() {
            req.param(name, query.offset.to_string());
        }
        Ok(req)
    }

    fn parse(
        &self,
        response: Value,
        query: &ProviderQuery,
        source: &str,
    ) -> Result<SearchPage, SourceError> {
        let results_ptr = pointer(self.config.results_pointer.trim());
        let items = match response.pointer(&results_ptr) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None if !results_ptr.is_empty() => {
                return Err(SourceError::Parse(format!(
                    "results_pointer `{results_ptr}` not found in response"
                )));
            }
            _ => {
                return Err(SourceError::Parse(format!(
                    "results_pointer `{results_ptr}` is not an array"
                )));
            }
        };

        let fields = &self.config.fields;
        let postings: Vec<RawPosting> = items
            .iter()
            .take(query.limit.max(1))
            .map(|item| {
                let posted_at = DateTime::parse_from_rfc3339(&text_at(item, fields.posted_at.as_deref()))
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
                let mut raw = RawPosting::new(
                    text_at(item, Some(fields.title.as_str())),
                    text_at(item, fields.company.as_deref()),
                    text_at(item, fields.link.as_deref()),
                    source,
                )
                .with_location(text_at(item, fields.location.as_deref()))
                .with_salary(text_at(item, fields.salary.as_deref()))
                .with_description(text_at(item, fields.description.as_deref()))
                .with_posted_at(posted_at);
                let id = text_at(item, fields.external_id.as_deref());
                if !id.is_empty() {
                    raw = raw.with_external_id(format!("{source}_{id}"));
                }
                raw
            })
            .collect();

        let total = self
            .config
            .total_pointer
            .as_deref()
            .and_then(|ptr| response.pointer(&pointer(ptr.trim())))
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(query.offset + postings.len());
        Ok(SearchPage::new(source, query, postings, total))
    }

    fn probe_query(&self) -> ProviderQuery {
        ProviderQuery::new(["software"], "", 1)
    }
}
