use chrono::{DateTime, NaiveDateTime, Utc};
use jobsift_common::{RawPosting, SourceError};
use jobsift_http::Auth;
use reqwest::header::{HeaderName, HeaderValue};

use crate::provider::{ApiSchema, ProviderRequest};
use crate::query::{JobType, ProviderQuery, SearchPage};
use crate::usajobs::types::{Descriptor, SearchResponse};

pub const DEFAULT_ENDPOINT: &str = "https://data.usajobs.gov/api/Search";

#[derive(Debug, Clone, Copy, Default)]
pub struct UsaJobs;

impl ApiSchema for UsaJobs {
    type Response = SearchResponse;

    fn id(&self) -> &'static str {
        "usajobs"
    }

    fn default_endpoint(&self) -> &'static str {
        DEFAULT_ENDPOINT
    }

    fn request<'a>(
        &'a self,
        query: &ProviderQuery,
        api_key: &'a str,
        _endpoint: &str,
    ) -> Result<ProviderRequest<'a>, SourceError> {
        let value = HeaderValue::from_str(api_key.trim())
            .map_err(|e| SourceError::NotConfigured(format!("invalid usajobs api key: {e}")))?;
        let mut req = ProviderRequest::new(Auth::Header {
            name: HeaderName::from_static("authorization-key"),
            value,
        });
        req.header("accept", "application/json")?;

        if !query.keywords.is_empty() {
            req.param("Keyword", query.keyword_line());
        }
        if !query.location.is_empty() {
            req.param("LocationName", query.location.clone());
        }
        if query.remote {
            req.param("RemoteIndicator", "true");
        }
        match query.job_type {
            Some(JobType::FullTime) => {
                req.param("PositionScheduleTypeCode", "1");
            }
            Some(JobType::PartTime) => {
                req.param("PositionScheduleTypeCode", "2");
            }
            _ => {}
        }
        req.param("ResultsPerPage", query.limit.to_string());
        if query.offset > 0 {
            req.param("Page", query.page().to_string());
        }
        if let Some(date) = query.date_posted {
            req.param("DatePosted", date.days().to_string());
        }
        Ok(req)
    }

    fn parse(
        &self,
        response: SearchResponse,
        query: &ProviderQuery,
        source: &str,
    ) -> Result<SearchPage, SourceError> {
        let result = response.search_result;
        let postings: Vec<RawPosting> = result
            .search_result_items
            .iter()
            .map(|item| to_posting(&item.matched_object_descriptor, source))
            .collect();
        let total = result.search_result_count_all.max(postings.len());
        Ok(SearchPage::new(source, query, postings, total))
    }

    fn probe_query(&self) -> ProviderQuery {
        ProviderQuery::new(["software"], "Washington, DC", 1)
    }
}

fn to_posting(descriptor: &Descriptor, source: &str) -> RawPosting {
    let link = if descriptor.position_uri.trim().is_empty() {
        descriptor.apply_uri.first().cloned().unwrap_or_default()
    } else {
        descriptor.position_uri.clone()
    };

    let posted_at = descriptor
        .publication_start_date
        .as_deref()
        .and_then(parse_publication_date);

    RawPosting::new(
        &descriptor.position_title,
        &descriptor.organization_name,
        link,
        source,
    )
    .with_external_id(format!("usajobs_{}", descriptor.position_id))
    .with_location(format_location(&descriptor.position_location_display.entries()))
    .with_description(&descriptor.user_area.details.job_summary)
    .with_salary(format_salary(descriptor))
    .with_posted_at(posted_at)
}

fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

fn format_location(locations: &[&str]) -> String {
    if locations.is_empty() {
        "Not specified".to_string()
    } else {
        locations.join(", ")
    }
}

fn format_salary(descriptor: &Descriptor) -> String {
    let Some(pay) = descriptor.position_remuneration.first() else {
        return String::new();
    };
    match (pay.minimum_range.trim(), pay.maximum_range.trim()) {
        ("", _) => String::new(),
        (min, "") => format!("${min}+ per year"),
        (min, max) => format!("${min} - ${max} per year"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "LanguageCode": "EN",
        "SearchResult": {
            "SearchResultCount": 2,
            "SearchResultCountAll": 37,
            "SearchResultItems": [
                {"MatchedObjectId": "1", "MatchedObjectDescriptor": {
                    "PositionID": "DOD-77",
                    "PositionTitle": "IT Specialist (Software)",
                    "PositionURI": "https://www.usajobs.gov/job/77",
                    "ApplyURI": ["https://apply.example.gov/77"],
                    "PositionLocationDisplay": ["Arlington, Virginia", "Remote"],
                    "OrganizationName": "Defense Digital Service",
                    "PositionRemuneration": [{"MinimumRange": "98496", "MaximumRange": "128043"}],
                    "PublicationStartDate": "2025-03-01T00:00:00.0000",
                    "UserArea": {"Details": {"JobSummary": "Build Python services"}}
                }},
                {"MatchedObjectId": "2", "MatchedObjectDescriptor": {
                    "PositionID": "NASA-5",
                    "PositionTitle": "Flight Software Engineer",
                    "PositionURI": "",
                    "ApplyURI": ["https://apply.example.gov/5"],
                    "PositionLocationDisplay": [],
                    "OrganizationName": "NASA"
                }}
            ]
        }
    }"#;

    #[test]
    fn parses_descriptors() {
        let response: SearchResponse = serde_json::from_str(BODY).unwrap();
        let page = UsaJobs
            .parse(response, &ProviderQuery::new(["software"], "", 25), "usajobs")
            .unwrap();

        assert_eq!(page.total, 37);
        assert!(!page.has_more);

        let first = &page.postings[0];
        assert_eq!(first.external_id.as_deref(), Some("usajobs_DOD-77"));
        assert_eq!(first.location, "Arlington, Virginia, Remote");
        assert_eq!(first.salary, "$98496 - $128043 per year");
        assert!(first.posted_at.is_some());

        let second = &page.postings[1];
        assert_eq!(second.link, "https://apply.example.gov/5");
        assert_eq!(second.location, "Not specified");
        assert_eq!(second.salary, "");
    }

    #[test]
    fn later_pages_send_page_number() {
        let mut query = ProviderQuery::new(["analyst"], "Denver", 10);
        query.offset = 20;
        query.job_type = Some(JobType::PartTime);
        let schema = UsaJobs;
        let req = schema.request(&query, "key", DEFAULT_ENDPOINT).unwrap();
        let pairs: Vec<(&str, &str)> = req.query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
        assert!(pairs.contains(&("Page", "3")));
        assert!(pairs.contains(&("PositionScheduleTypeCode", "2")));
        assert!(pairs.contains(&("ResultsPerPage", "10")));
    }

    #[test]
    fn single_location_string_is_accepted() {
        let body = r#"{"SearchResult": {"SearchResultItems": [{"MatchedObjectDescriptor": {
            "PositionID": "X", "PositionTitle": "Clerk", "PositionURI": "https://u/x",
            "PositionLocationDisplay": "Anywhere in the U.S.", "OrganizationName": "GSA"
        }}]}}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let page = UsaJobs
            .parse(response, &ProviderQuery::new(["clerk"], "", 5), "usajobs")
            .unwrap();
        assert_eq!(page.postings[0].location, "Anywhere in the U.S.");
        assert_eq!(page.total, 1);
    }
}
