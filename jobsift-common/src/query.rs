//! The canonical search issued uniformly to every source, plus the keyword
//! processor that turns free-form user input into one.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyword list plus location, built once per run.
///
/// Keywords keep their original order; matching treats them as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalQuery {
    pub keywords: Vec<String>,
    pub location: String,
}

impl CanonicalQuery {
    /// Trim, drop blank entries and remove case-insensitive repeats.
    pub fn new<I, S>(keywords: I, location: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
            .collect();

        Self {
            keywords,
            location: location.into().trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords joined with single spaces, the form most upstreams expect.
    pub fn keyword_line(&self) -> String {
        self.keywords.join(" ")
    }

    /// Query keywords followed by any `extra` ones not already present.
    pub fn keywords_with(&self, extra: &[String]) -> Vec<String> {
        let mut seen: HashSet<String> = self.keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut combined = self.keywords.clone();
        for keyword in extra {
            let trimmed = keyword.trim();
            if !trimmed.is_empty() && seen.insert(trimmed.to_lowercase()) {
                combined.push(trimmed.to_string());
            }
        }
        combined
    }
}

/// Output of [`KeywordProcessor::process`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedQuery {
    /// Cleaned terms, then synonyms, with exclusions removed.
    pub keywords: Vec<String>,
    /// Seniority, role and specialty phrases found in the cleaned input.
    pub patterns: Vec<String>,
    /// Exclusion list that was applied.
    pub exclusions: Vec<String>,
}

impl ProcessedQuery {
    pub fn into_query(self, location: impl Into<String>) -> CanonicalQuery {
        CanonicalQuery::new(self.keywords, location)
    }
}

const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "software engineer",
        &["developer", "programmer", "software developer", "software engineer", "swe"],
    ),
    ("developer", &["engineer", "programmer", "dev", "software developer"]),
    ("frontend", &["front-end", "front end", "ui developer", "web developer"]),
    ("backend", &["back-end", "back end", "server-side", "api developer"]),
    ("fullstack", &["full-stack", "full stack", "full-stack developer"]),
    (
        "devops",
        &["dev ops", "site reliability engineer", "sre", "infrastructure engineer"],
    ),
    (
        "mobile",
        &["ios", "android", "react native", "flutter", "mobile developer"],
    ),
    (
        "javascript",
        &["js", "node.js", "nodejs", "react", "vue", "angular"],
    ),
    ("python", &["django", "flask", "fastapi", "python developer"]),
    ("java", &["spring", "spring boot", "kotlin", "java developer"]),
    ("golang", &["go", "go developer", "golang developer"]),
    ("rust", &["rust developer", "systems programming"]),
    ("remote", &["work from home", "telecommute", "distributed", "wfh"]),
    ("senior", &["sr", "lead", "principal", "staff"]),
    ("junior", &["jr", "entry level", "associate", "graduate"]),
];

const DEFAULT_EXCLUSIONS: &[&str] = &[
    "internship",
    "unpaid",
    "volunteer",
    "commission only",
    "mlm",
    "pyramid",
    "door to door",
    "cold calling",
    "insurance sales",
];

const MIN_TERM_LEN: usize = 2;

fn strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s\-\+\.]").expect("static regex"))
}

fn split_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,;|]+").expect("static regex"))
}

fn job_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            r"(?i)\b(senior|sr|junior|jr|lead|principal|staff|entry.level)\b",
            r"(?i)\b(engineer|developer|programmer|architect|analyst|manager)\b",
            r"(?i)\b(full.stack|frontend|backend|devops|mobile)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static regex"))
        .collect()
    })
}

/// Cleans, expands and filters user keyword input.
///
/// ```
/// use jobsift_common::query::KeywordProcessor;
///
/// let processed = KeywordProcessor::new().process("Rust, Backend; unpaid-internship");
/// assert_eq!(processed.keywords, vec!["rust", "backend"]);
/// assert_eq!(processed.patterns, vec!["backend"]);
/// ```
#[derive(Debug, Clone)]
pub struct KeywordProcessor {
    synonyms: Vec<(String, Vec<String>)>,
    exclusions: Vec<String>,
    expand_synonyms: bool,
}

impl Default for KeywordProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordProcessor {
    /// Default tables with synonym expansion switched off.
    pub fn new() -> Self {
        Self {
            synonyms: DEFAULT_SYNONYMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            expand_synonyms: false,
        }
    }

    pub fn with_synonym_expansion(mut self, enabled: bool) -> Self {
        self.expand_synonyms = enabled;
        self
    }

    /// Replace the synonym list for `keyword`, or append a new table entry.
    pub fn add_synonyms<I, S>(&mut self, keyword: &str, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keyword = keyword.to_lowercase();
        let synonyms: Vec<String> = synonyms.into_iter().map(Into::into).collect();
        match self.synonyms.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, existing)) => *existing = synonyms,
            None => self.synonyms.push((keyword, synonyms)),
        }
    }

    pub fn add_exclusions<I, S>(&mut self, exclusions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions
            .extend(exclusions.into_iter().map(|e| e.into().to_lowercase()));
    }

    pub fn process(&self, input: &str) -> ProcessedQuery {
        let terms = clean_and_split(input);
        let expanded = if self.expand_synonyms {
            self.expand(&terms)
        } else {
            dedup_in_order(terms.clone())
        };
        let keywords = expanded
            .into_iter()
            .filter(|k| !self.is_excluded(k))
            .collect();

        ProcessedQuery {
            keywords,
            patterns: extract_patterns(&terms.join(" ")),
            exclusions: self.exclusions.clone(),
        }
    }

    /// The query itself, then each keyword alone, then every keyword pair.
    pub fn search_variations(&self, query: &CanonicalQuery) -> Vec<CanonicalQuery> {
        let mut variations = vec![query.clone()];
        let keywords = &query.keywords;
        if keywords.len() > 1 {
            for keyword in keywords {
                variations.push(CanonicalQuery::new([keyword], query.location.clone()));
            }
            for (i, first) in keywords.iter().enumerate() {
                for second in &keywords[i + 1..] {
                    variations.push(CanonicalQuery::new([first, second], query.location.clone()));
                }
            }
        }
        variations
    }

    fn expand(&self, terms: &[String]) -> Vec<String> {
        let mut expanded = terms.to_vec();
        for term in terms {
            if let Some((_, synonyms)) = self.synonyms.iter().find(|(k, _)| k == term) {
                expanded.extend(synonyms.iter().cloned());
            }
        }
        dedup_in_order(expanded)
    }

    fn is_excluded(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.exclusions
            .iter()
            .any(|e| keyword.contains(&e.to_lowercase()))
    }
}

fn clean_and_split(input: &str) -> Vec<String> {
    let lowered = input.to_lowercase();
    let cleaned = strip_pattern().replace_all(&lowered, " ");
    split_pattern()
        .split(&cleaned)
        .map(str::trim)
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(str::to_string)
        .collect()
}

fn extract_patterns(text: &str) -> Vec<String> {
    job_patterns()
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

fn dedup_in_order(terms: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_query_normalizes_keywords() {
        let query = CanonicalQuery::new([" rust ", "", "Tokio", "RUST"], " Berlin ");
        assert_eq!(query.keywords, vec!["rust", "Tokio"]);
        assert_eq!(query.location, "Berlin");
        assert_eq!(query.keyword_line(), "rust Tokio");
    }

    #[test]
    fn keywords_with_appends_unique_extras() {
        let query = CanonicalQuery::new(["rust"], "Remote");
        let combined = query.keywords_with(&["Rust".into(), "wasm".into(), " ".into()]);
        assert_eq!(combined, vec!["rust", "wasm"]);
    }

    #[test]
    fn cleaning_strips_symbols_and_short_terms() {
        let processed = KeywordProcessor::new().process("C++ / Node.js, a; ML|Go!");
        assert_eq!(processed.keywords, vec!["c++", "node.js", "ml", "go"]);
    }

    #[test]
    fn synonyms_follow_original_terms() {
        let processed = KeywordProcessor::new()
            .with_synonym_expansion(true)
            .process("golang rust");
        assert_eq!(
            processed.keywords,
            vec![
                "golang",
                "rust",
                "go",
                "go developer",
                "golang developer",
                "rust developer",
                "systems programming",
            ]
        );
    }

    #[test]
    fn exclusions_remove_matching_terms() {
        let mut processor = KeywordProcessor::new();
        processor.add_exclusions(["crypto"]);
        let processed = processor.process("rust cryptocurrency volunteering");
        assert_eq!(processed.keywords, vec!["rust"]);
    }

    #[test]
    fn custom_synonyms_replace_defaults() {
        let mut processor = KeywordProcessor::new().with_synonym_expansion(true);
        processor.add_synonyms("rust", ["ferris"]);
        processor.add_synonyms("zig", ["ziglang"]);
        assert_eq!(processor.process("rust zig").keywords, vec!["rust", "zig", "ferris", "ziglang"]);
    }

    #[test]
    fn patterns_capture_role_phrases() {
        let processed = KeywordProcessor::new().process("Senior Backend Engineer");
        assert_eq!(processed.patterns, vec!["senior", "engineer", "backend"]);
    }

    #[test]
    fn variations_cover_singles_and_pairs() {
        let query = CanonicalQuery::new(["a1", "b2", "c3"], "Remote");
        let variations = KeywordProcessor::new().search_variations(&query);
        assert_eq!(variations.len(), 1 + 3 + 3);
        assert_eq!(variations[4].keywords, vec!["a1", "b2"]);
        assert_eq!(variations[6].keywords, vec!["b2", "c3"]);
    }
}
