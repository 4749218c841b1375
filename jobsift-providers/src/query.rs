use std::str::FromStr;

use chrono::{DateTime, Utc};
use jobsift_common::{CanonicalQuery, RawPosting};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Intern,
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full-time" | "fulltime" => Ok(JobType::FullTime),
            "part-time" | "parttime" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "temporary" | "temp" => Ok(JobType::Temporary),
            "intern" | "internship" => Ok(JobType::Intern),
            other => Err(format!("unknown job type `{other}`")),
        }
    }
}

/// Recency filter: `1d`/`today`, `3d`, `7d`/`week`, `14d`, `30d`/`month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePosted {
    Today,
    ThreeDays,
    Week,
    Fortnight,
    Month,
}

impl DatePosted {
    pub fn days(&self) -> u32 {
        match self {
            DatePosted::Today => 1,
            DatePosted::ThreeDays => 3,
            DatePosted::Week => 7,
            DatePosted::Fortnight => 14,
            DatePosted::Month => 30,
        }
    }
}

impl FromStr for DatePosted {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" | "today" => Ok(DatePosted::Today),
            "3d" => Ok(DatePosted::ThreeDays),
            "7d" | "week" => Ok(DatePosted::Week),
            "14d" => Ok(DatePosted::Fortnight),
            "30d" | "month" => Ok(DatePosted::Month),
            other => Err(format!("unknown date filter `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryFilter {
    pub min: u32,
    pub max: u32,
    pub currency: String,
    /// yearly, monthly or hourly
    pub period: String,
}

/// The canonical query plus the knobs structured APIs understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuery {
    pub keywords: Vec<String>,
    pub location: String,
    pub remote: bool,
    pub salary: Option<SalaryFilter>,
    pub job_type: Option<JobType>,
    pub date_posted: Option<DatePosted>,
    pub limit: usize,
    pub offset: usize,
}

impl ProviderQuery {
    pub fn new<I, S>(keywords: I, location: impl Into<String>, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            location: location.into(),
            limit,
            ..Self::default()
        }
    }

    pub fn from_canonical(query: &CanonicalQuery, limit: usize) -> Self {
        Self::new(query.keywords.iter().cloned(), query.location.clone(), limit)
    }

    pub fn keyword_line(&self) -> String {
        self.keywords.join(" ")
    }

    /// 1-based page for the current offset.
    ///
    /// ```
    /// use jobsift_providers::ProviderQuery;
    ///
    /// let mut query = ProviderQuery::new(["rust"], "London", 25);
    /// assert_eq!(query.page(), 1);
    /// query.offset = 50;
    /// assert_eq!(query.page(), 3);
    /// ```
    pub fn page(&self) -> usize {
        self.offset / self.limit.max(1) + 1
    }
}

/// One page of provider results, still unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub postings: Vec<RawPosting>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
    pub provider: String,
    pub searched_at: DateTime<Utc>,
}

impl SearchPage {
    pub fn new(provider: &str, query: &ProviderQuery, postings: Vec<RawPosting>, total: usize) -> Self {
        let has_more = postings.len() == query.limit && total > query.offset + postings.len();
        Self {
            total,
            page: query.page(),
            per_page: query.limit,
            has_more,
            provider: provider.to_string(),
            searched_at: Utc::now(),
            postings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recency_aliases() {
        assert_eq!("today".parse::<DatePosted>(), Ok(DatePosted::Today));
        assert_eq!("7D".parse::<DatePosted>(), Ok(DatePosted::Week));
        assert_eq!("month".parse::<DatePosted>().map(|d| d.days()), Ok(30));
        assert!("2d".parse::<DatePosted>().is_err());
    }

    #[test]
    fn parses_job_types() {
        assert_eq!("Full-Time".parse::<JobType>(), Ok(JobType::FullTime));
        assert_eq!("temporary".parse::<JobType>(), Ok(JobType::Temporary));
        assert!("gig".parse::<JobType>().is_err());
    }

    #[test]
    fn page_survives_zero_limit() {
        let query = ProviderQuery::new(["go"], "", 0);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn has_more_needs_a_full_page_and_remaining_total() {
        let query = ProviderQuery::new(["go"], "", 2);
        let two = vec![
            RawPosting::new("a", "b", "c", "p"),
            RawPosting::new("d", "e", "f", "p"),
        ];
        assert!(SearchPage::new("p", &query, two.clone(), 10).has_more);
        assert!(!SearchPage::new("p", &query, two, 2).has_more);
    }
}
