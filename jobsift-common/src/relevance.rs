//! Relevance & identity rules applied to every posting at merge time.
//!
//! All matching here is plain lowercase substring search over
//! `title + " " + description`.

use std::collections::HashSet;

use crate::posting::{ExperienceLevel, JobPosting};

/// Technology vocabulary scanned by [`tech_keywords`], in reporting order.
pub const TECH_VOCABULARY: &[&str] = &[
    "javascript",
    "python",
    "java",
    "golang",
    "go",
    "rust",
    "c++",
    "c#",
    "react",
    "vue",
    "angular",
    "node.js",
    "express",
    "django",
    "flask",
    "kubernetes",
    "docker",
    "aws",
    "azure",
    "gcp",
    "terraform",
    "mongodb",
    "postgresql",
    "mysql",
    "redis",
    "elasticsearch",
    "microservices",
    "api",
    "rest",
    "graphql",
    "grpc",
    "machine learning",
    "ai",
    "data science",
    "blockchain",
    "frontend",
    "backend",
    "fullstack",
    "devops",
    "mobile",
    "ios",
    "android",
    "react native",
    "flutter",
];

const SENIOR_MARKERS: &[&str] = &["senior", "sr.", "lead", "principal"];
const JUNIOR_MARKERS: &[&str] = &["junior", "jr.", "entry", "graduate"];
const REMOTE_MARKERS: &[&str] = &["remote", "anywhere", "work from home"];

/// Stable content fingerprint over `lowercase(title) | lowercase(company) | link`.
///
/// ```
/// use jobsift_common::relevance::fingerprint;
///
/// let a = fingerprint("Rust Engineer", "Acme", "https://acme.dev/1");
/// let b = fingerprint("RUST ENGINEER", "acme", "https://acme.dev/1");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint(title: &str, company: &str, link: &str) -> String {
    let data = format!(
        "{}|{}|{}",
        title.to_lowercase(),
        company.to_lowercase(),
        link
    );
    blake3::hash(data.as_bytes()).to_hex().to_string()
}

fn haystack(title: &str, description: &str) -> String {
    format!("{title} {description}").to_lowercase()
}

/// Score `keywords` against a posting's text.
///
/// Each keyword found in title or description counts once, and once more when
/// it also appears in the title; the sum is divided by `keywords.len()`. The
/// result lies in `[0, 2]` and is `0` for an empty keyword set.
pub fn relevance<S: AsRef<str>>(title: &str, description: &str, keywords: &[S]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }

    let text = haystack(title, description);
    let title = title.to_lowercase();
    let mut matches = 0usize;

    for keyword in keywords {
        let keyword = keyword.as_ref().to_lowercase();
        if text.contains(&keyword) {
            matches += 1;
            if title.contains(&keyword) {
                matches += 1;
            }
        }
    }

    matches as f64 / keywords.len() as f64
}

/// Technology terms present in the posting, in [`TECH_VOCABULARY`] order.
pub fn tech_keywords(title: &str, description: &str) -> Vec<String> {
    let text = haystack(title, description);
    TECH_VOCABULARY
        .iter()
        .filter(|term| text.contains(*term))
        .map(|term| (*term).to_string())
        .collect()
}

/// Seniority markers win over junior markers; anything else is mid level.
pub fn experience_level(title: &str, description: &str) -> ExperienceLevel {
    let text = haystack(title, description);
    if SENIOR_MARKERS.iter().any(|m| text.contains(m)) {
        ExperienceLevel::Senior
    } else if JUNIOR_MARKERS.iter().any(|m| text.contains(m)) {
        ExperienceLevel::Junior
    } else {
        ExperienceLevel::Mid
    }
}

/// True when location, title or description mentions remote work.
pub fn is_remote(location: &str, title: &str, description: &str) -> bool {
    let text = format!("{location} {title} {description}").to_lowercase();
    REMOTE_MARKERS.iter().any(|m| text.contains(m))
}

/// Two postings are duplicates when their fingerprints match or their title and
/// company match case-insensitively.
pub fn is_duplicate(a: &JobPosting, b: &JobPosting) -> bool {
    a.id == b.id
        || (a.title.to_lowercase() == b.title.to_lowercase()
            && a.company.to_lowercase() == b.company.to_lowercase())
}

/// Drop duplicates, keeping the first occurrence of each posting.
///
/// Returns the surviving postings in their original order.
pub fn dedup(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen_ids = HashSet::with_capacity(postings.len());
    let mut seen_pairs = HashSet::with_capacity(postings.len());

    postings
        .into_iter()
        .filter(|p| {
            let pair = (p.title.to_lowercase(), p.company.to_lowercase());
            let fresh = !seen_ids.contains(&p.id) && !seen_pairs.contains(&pair);
            if fresh {
                seen_ids.insert(p.id.clone());
                seen_pairs.insert(pair);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawPosting;

    fn posting(title: &str, company: &str, link: &str) -> JobPosting {
        RawPosting::new(title, company, link, "test")
            .into_posting()
            .expect("valid posting")
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let first = fingerprint("Backend Engineer", "Acme", "https://acme.dev/a");
        let second = fingerprint("Backend Engineer", "Acme", "https://acme.dev/a");
        assert_eq!(first, second);
    }

    #[test]
    fn fingerprint_keeps_link_case() {
        let lower = fingerprint("t", "c", "https://acme.dev/job");
        let upper = fingerprint("t", "c", "https://acme.dev/JOB");
        assert_ne!(lower, upper);
    }

    #[test]
    fn senior_backend_scenario() {
        let title = "Senior Backend Engineer";
        let description = "Remote role using Python and Kubernetes";
        let keywords = ["python", "kubernetes", "senior"];

        let score = relevance(title, description, &keywords);
        assert!((score - 4.0 / 3.0).abs() < 1e-9);

        let tech = tech_keywords(title, description);
        assert!(tech.contains(&"python".to_string()));
        assert!(tech.contains(&"kubernetes".to_string()));

        assert_eq!(experience_level(title, description), ExperienceLevel::Senior);
        assert!(is_remote("", title, description));
    }

    #[test]
    fn relevance_is_zero_without_keywords() {
        let none: [&str; 0] = [];
        assert_eq!(relevance("Rust Engineer", "rust rust", &none), 0.0);
    }

    #[test]
    fn relevance_stays_within_bounds() {
        let keywords = ["rust", "engineer", "tokio", "haskell"];
        let cases = [
            ("Rust Engineer", "tokio services"),
            ("", ""),
            ("Haskell", "nothing else"),
            ("rust engineer tokio haskell", "rust engineer tokio haskell"),
        ];
        for (title, description) in cases {
            let score = relevance(title, description, &keywords);
            assert!((0.0..=2.0).contains(&score), "{score} out of range");
        }
        assert_eq!(relevance(cases[3].0, cases[3].1, &keywords), 2.0);
    }

    #[test]
    fn relevance_ignores_keyword_order_and_case() {
        let a = relevance("Go Developer", "Docker", &["docker", "GO"]);
        let b = relevance("Go Developer", "Docker", &["go", "Docker"]);
        assert_eq!(a, b);
    }

    #[test]
    fn tech_keywords_follow_vocabulary_order() {
        let found = tech_keywords("Docker and Python", "some javascript");
        // Substring matching also finds "java" inside "javascript".
        assert_eq!(found, vec!["javascript", "python", "java", "docker"]);
    }

    #[test]
    fn senior_markers_take_priority_over_junior() {
        assert_eq!(
            experience_level("Junior to Senior Developer", ""),
            ExperienceLevel::Senior
        );
        assert_eq!(
            experience_level("Graduate Developer", ""),
            ExperienceLevel::Junior
        );
        assert_eq!(experience_level("Developer", "build things"), ExperienceLevel::Mid);
    }

    #[test]
    fn same_title_company_different_link_is_duplicate() {
        let a = posting("Data Engineer", "Initech", "https://board.example/jobs/1");
        let b = posting("data engineer", "INITECH", "https://board.example/listing/1");
        assert_ne!(a.id, b.id);
        assert!(is_duplicate(&a, &b));

        let kept = dedup(vec![a.clone(), b]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].link, a.link);
    }

    #[test]
    fn dedup_keeps_distinct_postings_in_order() {
        let kept = dedup(vec![
            posting("A", "X", "https://x/1"),
            posting("B", "X", "https://x/2"),
            posting("A", "X", "https://x/1"),
            posting("C", "Y", "https://y/3"),
        ]);
        let titles: Vec<_> = kept.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }
}
