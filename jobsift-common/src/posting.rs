use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::relevance;

/// Seniority bucket derived from title and description markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A posting candidate as produced by an extraction strategy.
///
/// Nothing is validated or derived yet; [`RawPosting::into_posting`] performs
/// both and discards incomplete candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosting {
    pub external_id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub link: String,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl RawPosting {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            link: link.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary = salary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_posted_at(mut self, posted_at: Option<DateTime<Utc>>) -> Self {
        self.posted_at = posted_at;
        self
    }

    /// True when title, company and link are all non-blank.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.company.trim().is_empty()
            && !self.link.trim().is_empty()
    }

    /// Validate and normalize into a [`JobPosting`].
    ///
    /// Returns `None` for candidates missing a title, company or link. The
    /// fingerprint, tech keywords, experience level and remote flag are derived
    /// here once; relevance starts at zero until [`JobPosting::score`] runs.
    pub fn into_posting(self) -> Option<JobPosting> {
        if !self.is_complete() {
            return None;
        }

        let title = self.title.trim().to_string();
        let company = self.company.trim().to_string();
        let link = self.link.trim().to_string();
        let location = self.location.trim().to_string();
        let description = self.description.trim().to_string();
        let now = Utc::now();

        Some(JobPosting {
            id: relevance::fingerprint(&title, &company, &link),
            external_id: self.external_id.filter(|id| !id.is_empty()),
            keywords: relevance::tech_keywords(&title, &description),
            experience_level: relevance::experience_level(&title, &description),
            remote: relevance::is_remote(&location, &title, &description),
            salary: self.salary.trim().to_string(),
            source: self.source,
            relevance: 0.0,
            is_active: true,
            posted_at: self.posted_at,
            scraped_at: now,
            updated_at: now,
            title,
            company,
            location,
            description,
            link,
        })
    }
}

/// The canonical, validated job record.
///
/// `id` is the content fingerprint computed at creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    pub source: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub remote: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl JobPosting {
    /// Recompute the relevance score against `keywords`.
    pub fn score<S: AsRef<str>>(&mut self, keywords: &[S]) {
        self.relevance = relevance::relevance(&self.title, &self.description, keywords);
    }
}
