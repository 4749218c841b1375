use chrono::{NaiveDate, TimeZone, Utc};
use jobsift_common::{RawPosting, SourceError};
use jobsift_http::Auth;

use crate::provider::{ApiSchema, ProviderRequest};
use crate::query::{JobType, ProviderQuery, SearchPage};
use crate::reed::types::{ReedJob, SearchResponse};

pub const DEFAULT_ENDPOINT: &str = "https://www.reed.co.uk/api/1.0/search";

#[derive(Debug, Clone, Copy, Default)]
pub struct Reed;

impl ApiSchema for Reed {
    type Response = SearchResponse;

    fn id(&self) -> &'static str {
        "reed"
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
        let mut req = ProviderRequest::new(Auth::Basic {
            username: api_key,
            password: Some(""),
        });
        req.header("accept", "application/json")?;

        if !query.keywords.is_empty() {
            req.param("keywords", query.keyword_line());
        }
        if !query.location.is_empty() {
            req.param("locationName", query.location.clone());
        }
        if query.remote {
            req.param("remote", "true");
        }
        if let Some(salary) = &query.salary {
            if salary.min > 0 {
                req.param("minimumSalary", salary.min.to_string());
            }
            if salary.max > 0 {
                req.param("maximumSalary", salary.max.to_string());
            }
        }
        match query.job_type {
            Some(JobType::FullTime) => {
                req.param("fullTime", "true");
            }
            Some(JobType::PartTime) => {
                req.param("partTime", "true");
            }
            Some(JobType::Contract) => {
                req.param("contract", "true");
            }
            Some(JobType::Temporary) => {
                req.param("temp", "true");
            }
            Some(JobType::Intern) | None => {}
        }
        req.param("resultsToTake", query.limit.to_string());
        if query.offset > 0 {
            req.param("resultsToSkip", query.offset.to_string());
        }
        if let Some(date) = query.date_posted {
            req.param("postedByDays", date.days().to_string());
        }
        Ok(req)
    }

    fn parse(
        &self,
        response: SearchResponse,
        query: &ProviderQuery,
        source: &str,
    ) -> Result<SearchPage, SourceError> {
        let postings = response
            .results
            .iter()
            .map(|job| to_posting(job, source))
            .collect();
        Ok(SearchPage::new(source, query, postings, response.total_results))
    }

    fn probe_query(&self) -> ProviderQuery {
        ProviderQuery::new(["software"], "London", 1)
    }
}

fn to_posting(job: &ReedJob, source: &str) -> RawPosting {
    let posted_at = job
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%d/%m/%Y").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt));

    RawPosting::new(&job.job_title, &job.employer_name, &job.job_url, source)
        .with_external_id(format!("reed_{}", job.job_id))
        .with_location(&job.location_name)
        .with_description(&job.job_description)
        .with_salary(format_salary(job.minimum_salary, job.maximum_salary))
        .with_posted_at(posted_at)
}

fn format_salary(min: Option<f64>, max: Option<f64>) -> String {
    match (min.filter(|v| *v > 0.0), max.filter(|v| *v > 0.0)) {
        (Some(min), Some(max)) => format!("£{min:.0} - £{max:.0} per year"),
        (Some(min), None) => format!("£{min:.0}+ per year"),
        _ => String::new(),
    }
}
