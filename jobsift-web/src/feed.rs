//! RSS/Atom extraction with heuristic company/location inference and a
//! keyword include/exclude post-filter.
use chrono::{DateTime, Utc};
use jobsift_common::{CanonicalQuery, RawPosting, SourceError};
use jobsift_config::{FeedConfig, FeedType};
use jobsift_http::{HttpClient, RequestOpts};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

use crate::text::html_to_text;

const UNKNOWN_COMPANY: &str = "Unknown Company";
const UNKNOWN_LOCATION: &str = "Not Specified";

/// Company markers in priority order.
const COMPANY_MARKERS: &[&str] = &["at ", "@ ", "company:", "employer:", "hiring:"];
const COMPANY_SEPARATORS: &[char] = &['-', '|', '(', '–', '\n'];
const MAX_COMPANY_WORDS: usize = 3;

const LOCATIONS: &[&str] = &[
    "remote",
    "anywhere",
    "worldwide",
    "global",
    "san francisco",
    "new york",
    "london",
    "berlin",
    "toronto",
    "sydney",
    "tokyo",
    "mumbai",
    "bangalore",
    "austin",
    "seattle",
    "boston",
    "chicago",
    "denver",
];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    fn link(&self) -> String {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate") && !l.href.is_empty())
            .or_else(|| self.links.first())
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default()
    }
}

/// One feed entry reduced to the common fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// Parse a feed document into entries, in document order.
pub fn parse_feed(body: &str, feed_type: FeedType) -> Result<Vec<FeedEntry>, SourceError> {
    match feed_type {
        FeedType::Rss => {
            let rss: Rss = quick_xml::de::from_str(body)
                .map_err(|e| SourceError::Parse(format!("rss: {e}")))?;
            Ok(rss
                .channel
                .items
                .into_iter()
                .map(|item| FeedEntry {
                    title: html_to_text(item.title.as_deref().unwrap_or_default()),
                    description: html_to_text(item.description.as_deref().unwrap_or_default()),
                    link: item.link.unwrap_or_default().trim().to_string(),
                    published: item.pub_date.as_deref().and_then(parse_rfc2822),
                })
                .collect())
        }
        FeedType::Atom => {
            let feed: AtomFeed = quick_xml::de::from_str(body)
                .map_err(|e| SourceError::Parse(format!("atom: {e}")))?;
            Ok(feed
                .entries
                .into_iter()
                .map(|entry| {
                    let link = entry.link();
                    let body = entry
                        .summary
                        .as_ref()
                        .filter(|t| !t.value.trim().is_empty())
                        .or(entry.content.as_ref())
                        .map(|t| t.value.as_str())
                        .unwrap_or_default();
                    FeedEntry {
                        title: html_to_text(entry.title.as_ref().map(|t| t.value.as_str()).unwrap_or_default()),
                        description: html_to_text(body),
                        link,
                        published: entry
                            .published
                            .as_deref()
                            .or(entry.updated.as_deref())
                            .and_then(parse_rfc3339),
                    }
                })
                .collect())
        }
    }
}

fn parse_rfc2822(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn at_word_boundary(text: &str, index: usize) -> bool {
    text[..index]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric())
}

/// Clip the short phrase following a company marker.
fn clip_company(rest: &str) -> String {
    let rest = rest.trim_start();
    let end = rest.find(COMPANY_SEPARATORS).unwrap_or(rest.len());
    let mut words = Vec::new();
    for word in rest[..end].split_whitespace().take(MAX_COMPANY_WORDS) {
        if let Some(stripped) = word.strip_suffix(',') {
            if !stripped.is_empty() {
                words.push(stripped);
            }
            break;
        }
        words.push(word);
    }
    words
        .join(" ")
        .trim_end_matches(['.', ':', ';'])
        .to_string()
}

/// Company name guessed from free text, else `Unknown Company`.
///
/// ```
/// use jobsift_web::infer_company;
///
/// assert_eq!(infer_company("Rust Engineer at Acme Corp - Remote"), "Acme Corp");
/// assert_eq!(infer_company("Hiring: Platform Team (contract)"), "Platform Team");
/// assert_eq!(infer_company("Backend developer wanted"), "Unknown Company");
/// ```
pub fn infer_company(text: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original.
    let lowered = text.to_ascii_lowercase();
    for marker in COMPANY_MARKERS {
        let found = lowered
            .match_indices(marker)
            .map(|(i, _)| i)
            .find(|&i| at_word_boundary(&lowered, i));
        if let Some(start) = found {
            let company = clip_company(&text[start + marker.len()..]);
            if !company.is_empty() {
                return company;
            }
        }
    }
    UNKNOWN_COMPANY.to_string()
}

/// First location vocabulary entry mentioned in `text`, title-cased.
pub fn infer_location(text: &str) -> String {
    let lowered = text.to_lowercase();
    LOCATIONS
        .iter()
        .find(|loc| lowered.contains(*loc))
        .map(|loc| title_case(loc))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

fn title_case(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Include/exclude filter over title and description.
///
/// An empty include list lets everything through.
pub fn passes_filter(entry: &FeedEntry, include: &[String], exclude: &[String]) -> bool {
    let haystack = format!("{} {}", entry.title, entry.description).to_lowercase();
    let excluded = exclude
        .iter()
        .map(|w| w.trim().to_lowercase())
        .any(|w| !w.is_empty() && haystack.contains(&w));
    if excluded {
        return false;
    }
    include.is_empty()
        || include
            .iter()
            .any(|k| haystack.contains(&k.trim().to_lowercase()))
}

fn feed_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5",
        ),
    );
    headers
}

/// Feed extraction strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedExtractor;

impl FeedExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(
        &self,
        name: &str,
        config: &FeedConfig,
        query: &CanonicalQuery,
        http: &HttpClient,
        cap: usize,
    ) -> Result<Vec<RawPosting>, SourceError> {
        tracing::info!(source = %name, url = %config.feed_url, "feed.fetch");
        let response = http
            .get_text(
                &config.feed_url,
                RequestOpts {
                    headers: Some(feed_headers()),
                    ..Default::default()
                },
            )
            .await?;

        let entries = parse_feed(&response.body, config.feed_type)?;
        let total = entries.len();
        let include = query.keywords_with(&config.keywords);
        let postings = filter_entries(entries, &include, &config.exclude_words, name, cap);
        tracing::debug!(source = %name, entries = total, kept = postings.len(), "feed.parse.complete");
        Ok(postings)
    }
}

/// Apply the keyword filter, infer company and location, then the cap.
pub fn filter_entries(
    entries: Vec<FeedEntry>,
    include: &[String],
    exclude: &[String],
    source: &str,
    cap: usize,
) -> Vec<RawPosting> {
    entries
        .into_iter()
        .filter(|e| !e.title.is_empty() && !e.link.is_empty())
        .filter(|e| passes_filter(e, include, exclude))
        .take(cap)
        .map(|entry| {
            // Newline is a company separator, so a title marker never spills into the body.
            let text = format!("{}\n{}", entry.title, entry.description);
            RawPosting::new(entry.title, infer_company(&text), entry.link, source)
                .with_location(infer_location(&text))
                .with_description(entry.description)
                .with_posted_at(entry.published)
        })
        .collect()
}
