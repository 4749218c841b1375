use chrono::{DateTime, Utc};
use jobsift_common::{RawPosting, SourceError};
use jobsift_http::Auth;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::jsearch::types::{JSearchJob, SearchResponse};
use crate::provider::{ApiSchema, ProviderRequest};
use crate::query::{DatePosted, JobType, ProviderQuery, SearchPage};

pub const DEFAULT_ENDPOINT: &str = "https://jsearch.p.rapidapi.com/search";
const DEFAULT_HOST: &str = "jsearch.p.rapidapi.com";

#[derive(Debug, Clone, Copy, Default)]
pub struct JSearch;

impl ApiSchema for JSearch {
    type Response = SearchResponse;

    fn id(&self) -> &'static str {
        "jsearch"
    }

    fn default_endpoint(&self) -> &'static str {
        DEFAULT_ENDPOINT
    }

    fn request<'a>(
        &'a self,
        query: &ProviderQuery,
        api_key: &'a str,
        endpoint: &str,
    ) -> Result<ProviderRequest<'a>, SourceError> {
        let value = HeaderValue::from_str(api_key.trim())
            .map_err(|e| SourceError::NotConfigured(format!("invalid rapidapi key: {e}")))?;
        let mut req = ProviderRequest::new(Auth::Header {
            name: HeaderName::from_static("x-rapidapi-key"),
            value,
        });

        // RapidAPI routes on this header, so it follows a configured endpoint.
        let host = Url::parse(endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        req.header("x-rapidapi-host", &host)?;
        req.header("accept", "application/json")?;

        let mut parts = Vec::new();
        if !query.keywords.is_empty() {
            parts.push(query.keyword_line());
        }
        if !query.location.is_empty() {
            parts.push(format!("in {}", query.location));
        }
        if !parts.is_empty() {
            req.param("query", parts.join(" "));
        }
        req.param("num_pages", "1");
        req.param("page", query.page().to_string());
        if query.remote {
            req.param("remote_jobs_only", "true");
        }
        let employment = match query.job_type {
            Some(JobType::FullTime) => Some("FULLTIME"),
            Some(JobType::PartTime) => Some("PARTTIME"),
            Some(JobType::Contract) => Some("CONTRACTOR"),
            Some(JobType::Intern) => Some("INTERN"),
            Some(JobType::Temporary) | None => None,
        };
        if let Some(kind) = employment {
            req.param("employment_types", kind);
        }
        let recency = match query.date_posted {
            Some(DatePosted::Today) => Some("today"),
            Some(DatePosted::ThreeDays) => Some("3days"),
            Some(DatePosted::Week) => Some("week"),
            Some(DatePosted::Month) => Some("month"),
            Some(DatePosted::Fortnight) | None => None,
        };
        if let Some(recency) = recency {
            req.param("date_posted", recency);
        }
        Ok(req)
    }

    fn parse(
        &self,
        response: SearchResponse,
        query: &ProviderQuery,
        source: &str,
    ) -> Result<SearchPage, SourceError> {
        if response.status != "OK" {
            return Err(SourceError::Parse(format!(
                "API returned error: {}",
                response.status
            )));
        }
        let postings: Vec<RawPosting> = response
            .data
            .iter()
            .map(|job| to_posting(job, source))
            .collect();
        // JSearch reports no grand total; a full page suggests more.
        let total = if postings.len() == query.limit {
            query.offset + postings.len() + 1
        } else {
            query.offset + postings.len()
        };
        Ok(SearchPage::new(source, query, postings, total))
    }

    fn probe_query(&self) -> ProviderQuery {
        ProviderQuery::new(["software engineer"], "New York", 1)
    }
}

fn to_posting(job: &JSearchJob, source: &str) -> RawPosting {
    let description = match job.job_employment_type.as_deref().map(str::trim) {
        Some(kind) if !kind.is_empty() => format!("[{kind}] {}", job.job_description),
        _ => job.job_description.clone(),
    };
    let posted_at = job
        .job_posted_at_datetime_utc
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    RawPosting::new(&job.job_title, &job.employer_name, &job.job_apply_link, source)
        .with_external_id(format!("jsearch_{}", job.job_id))
        .with_location(format_location(job))
        .with_description(description)
        .with_salary(format_salary(job))
        .with_posted_at(posted_at)
}

fn format_location(job: &JSearchJob) -> String {
    let parts: Vec<&str> = [&job.job_city, &job.job_state, &job.job_country]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        "Not specified".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_salary(job: &JSearchJob) -> String {
    let currency = match job.job_salary_currency.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => format!("{code} "),
        _ => "$".to_string(),
    };
    let period = match job.job_salary_period.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => format!("per {p}"),
        _ => "per year".to_string(),
    };
    match (job.job_min_salary, job.job_max_salary) {
        (Some(min), Some(max)) => format!("{currency}{min:.0} - {currency}{max:.0} {period}"),
        (Some(min), None) => format!("{currency}{min:.0}+ {period}"),
        _ => String::new(),
    }
}
