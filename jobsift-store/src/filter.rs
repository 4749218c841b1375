use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use jobsift_common::JobPosting;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Search criteria for stored postings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFilter {
    /// Any-of, matched against title and description.
    pub keywords: Vec<String>,
    pub location: Option<String>,
    /// Case-insensitive allow-list.
    pub sources: Vec<String>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub scraped_after: Option<DateTime<Utc>>,
    pub scraped_before: Option<DateTime<Utc>>,
    pub active: Option<bool>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl JobFilter {
    pub fn matches(&self, posting: &JobPosting) -> bool {
        if !self.keywords.is_empty() {
            let text = format!("{} {}", posting.title, posting.description).to_lowercase();
            let hit = self
                .keywords
                .iter()
                .any(|k| text.contains(&k.trim().to_lowercase()));
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if !posting
                .location
                .to_lowercase()
                .contains(&location.trim().to_lowercase())
            {
                return false;
            }
        }

        if !self.sources.is_empty()
            && !self
                .sources
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&posting.source))
        {
            return false;
        }

        if self.salary_min.is_some() || self.salary_max.is_some() {
            let Some((low, high)) = parse_salary(&posting.salary) else {
                return false;
            };
            let floor = self.salary_min.unwrap_or(0);
            let ceiling = self.salary_max.unwrap_or(u32::MAX);
            if high < floor || low > ceiling {
                return false;
            }
        }

        if self.scraped_after.is_some_and(|after| posting.scraped_at < after) {
            return false;
        }
        if self.scraped_before.is_some_and(|before| posting.scraped_at > before) {
            return false;
        }
        if self.active.is_some_and(|active| posting.is_active != active) {
            return false;
        }
        true
    }

    /// Matching postings sorted by relevance then recency, paginated, plus the
    /// match count before pagination.
    pub fn apply<'a, I>(&self, postings: I) -> (Vec<JobPosting>, usize)
    where
        I: IntoIterator<Item = &'a JobPosting>,
    {
        let mut matched: Vec<JobPosting> = postings
            .into_iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| b.scraped_at.cmp(&a.scraped_at))
        });

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        (page, total)
    }
}

fn salary_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kK])?").expect("static regex"))
}

/// Heuristic `(min, max)` from free-text salary.
///
/// ```
/// use jobsift_store::parse_salary;
///
/// assert_eq!(parse_salary("$90k - $120k"), Some((90_000, 120_000)));
/// assert_eq!(parse_salary("£50,000+ per year"), Some((50_000, 50_000)));
/// assert_eq!(parse_salary("Competitive"), None);
/// ```
pub fn parse_salary(raw: &str) -> Option<(u32, u32)> {
    let mut numbers = salary_number().captures_iter(raw).filter_map(|caps| {
        let digits = caps.get(1)?.as_str().replace(',', "");
        let mut value: f64 = digits.parse().ok()?;
        if caps.get(2).is_some() {
            value *= 1000.0;
        }
        Some(value.round().clamp(0.0, u32::MAX as f64) as u32)
    });
    let min = numbers.next()?;
    let max = numbers.next().unwrap_or(min);
    Some((min, max.max(min)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jobsift_common::RawPosting;

    fn posting(title: &str, source: &str, salary: &str, relevance: f64) -> JobPosting {
        let mut p = RawPosting::new(title, "Acme", format!("https://a/{title}"), source)
            .with_location("Berlin, Germany")
            .with_salary(salary)
            .into_posting()
            .unwrap();
        p.relevance = relevance;
        p
    }

    #[test]
    fn salary_overlap_needs_a_parseable_salary() {
        let filter = JobFilter {
            salary_min: Some(100_000),
            ..JobFilter::default()
        };
        assert!(filter.matches(&posting("a", "s", "$90k - $120k", 0.0)));
        assert!(!filter.matches(&posting("b", "s", "$60,000", 0.0)));
        assert!(!filter.matches(&posting("c", "s", "DOE", 0.0)));
        assert!(JobFilter::default().matches(&posting("d", "s", "DOE", 0.0)));
    }

    #[test]
    fn sources_location_and_dates() {
        let p = posting("rust dev", "RemoteOK", "", 0.0);
        let by_source = JobFilter {
            sources: vec!["remoteok".into()],
            location: Some("berlin".into()),
            ..JobFilter::default()
        };
        assert!(by_source.matches(&p));

        let after = JobFilter {
            scraped_after: Some(p.scraped_at + Duration::hours(1)),
            ..JobFilter::default()
        };
        assert!(!after.matches(&p));

        let inactive = JobFilter {
            active: Some(false),
            ..JobFilter::default()
        };
        assert!(!inactive.matches(&p));
    }

    #[test]
    fn apply_sorts_and_paginates() {
        let postings = vec![
            posting("low", "s", "", 0.5),
            posting("high", "s", "", 2.0),
            posting("mid", "s", "", 1.0),
        ];
        let filter = JobFilter {
            limit: Some(2),
            offset: 1,
            ..JobFilter::default()
        };
        let (page, total) = filter.apply(&postings);
        assert_eq!(total, 3);
        let titles: Vec<&str> = page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["mid", "low"]);
    }
}
