use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use jobsift_common::JobPosting;
use serde::{Deserialize, Serialize};

/// Aggregate counts over the stored postings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    pub total_jobs: usize,
    /// Scraped within the last 24 hours.
    pub recent_jobs: usize,
    pub last_scraped: Option<DateTime<Utc>>,
    pub jobs_by_source: BTreeMap<String, usize>,
    pub jobs_by_location: BTreeMap<String, usize>,
    pub keywords: BTreeMap<String, usize>,
}

impl JobStats {
    pub fn from_postings<'a, I>(postings: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a JobPosting>,
    {
        let cutoff = now - Duration::hours(24);
        let mut stats = JobStats::default();
        for posting in postings {
            stats.total_jobs += 1;
            if posting.scraped_at >= cutoff {
                stats.recent_jobs += 1;
            }
            stats.last_scraped = stats.last_scraped.max(Some(posting.scraped_at));
            *stats.jobs_by_source.entry(posting.source.clone()).or_default() += 1;
            if !posting.location.is_empty() {
                *stats
                    .jobs_by_location
                    .entry(posting.location.clone())
                    .or_default() += 1;
            }
            for keyword in &posting.keywords {
                *stats.keywords.entry(keyword.clone()).or_default() += 1;
            }
        }
        stats
    }

    pub fn top_locations(&self, n: usize) -> Vec<(String, usize)> {
        top(&self.jobs_by_location, n)
    }

    pub fn top_keywords(&self, n: usize) -> Vec<(String, usize)> {
        top(&self.keywords, n)
    }
}

/// Highest counts first; ties broken by name.
fn top(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsift_common::RawPosting;

    #[test]
    fn counts_and_rankings() {
        let make = |title: &str, location: &str, description: &str| {
            RawPosting::new(title, "Acme", format!("https://a/{title}"), "board")
                .with_location(location)
                .with_description(description)
                .into_posting()
                .unwrap()
        };
        let mut old = make("Go Dev", "Berlin", "Go and Docker");
        old.scraped_at = Utc::now() - Duration::days(3);
        let postings = vec![
            make("Rust Dev", "London", "Rust and Docker"),
            make("Python Dev", "Berlin", "Python and Docker"),
            old,
        ];

        let stats = JobStats::from_postings(&postings, Utc::now());
        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.recent_jobs, 2);
        assert_eq!(stats.jobs_by_source["board"], 3);
        assert_eq!(
            stats.top_locations(2),
            vec![("Berlin".to_string(), 2), ("London".to_string(), 1)]
        );
        assert_eq!(stats.top_keywords(1), vec![("docker".to_string(), 3)]);
    }
}
