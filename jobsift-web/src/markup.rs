//! Markup extraction: fill the search template, fetch one page, and apply
//! the source's selector rules to each job container.
use std::sync::Arc;

use jobsift_common::{CanonicalQuery, RawPosting, SourceError};
use jobsift_config::{RenderMode, ScrapeConfig, SelectorMap};
use jobsift_http::{HttpClient, RequestOpts};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::browser::{BrowserRenderer, RenderedCard};
use crate::text::element_text;

/// Board names that are known to render listings client-side.
const SCRIPTED_BOARDS: &[&str] = &[
    "linkedin",
    "glassdoor",
    "indeed",
    "naukri",
    "angel",
    "wellfound",
    "ycombinator",
    "greenhouse",
    "lever",
    "workday",
    "bamboohr",
    "smartrecruiters",
    "jobvite",
    "icims",
    "bullhorn",
    "cornerstone",
];

/// URL fragments typical of client-rendered career pages.
const SCRIPTED_URL_HINTS: &[&str] = &["jobs.", "careers.", "apply.", "workday", "greenhouse", "lever"];

/// Whether a source goes through the browser path.
///
/// ```
/// use jobsift_config::{RenderMode, ScrapeConfig, SelectorMap};
/// use jobsift_web::requires_browser;
///
/// let mut config = ScrapeConfig {
///     base_url: "https://boards.greenhouse.io/acme".into(),
///     search_path: String::new(),
///     search_params: vec![],
///     render: RenderMode::Auto,
///     selectors: SelectorMap::default(),
/// };
/// assert!(requires_browser("acme", &config));
///
/// config.render = RenderMode::Static;
/// assert!(!requires_browser("acme", &config));
/// ```
pub fn requires_browser(name: &str, config: &ScrapeConfig) -> bool {
    match config.render {
        RenderMode::Static => false,
        RenderMode::Browser => true,
        RenderMode::Auto => {
            let name = name.to_lowercase();
            let base = config.base_url.to_lowercase();
            SCRIPTED_BOARDS.iter().any(|board| name.contains(board))
                || SCRIPTED_URL_HINTS.iter().any(|hint| base.contains(hint))
        }
    }
}

/// `base_url + search_path` with the parameter template filled in, in
/// declaration order.
pub fn build_search_url(config: &ScrapeConfig, query: &CanonicalQuery) -> Result<Url, SourceError> {
    let base = config.base_url.trim_end_matches('/');
    let path = config.search_path.trim();
    let joined = if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') || path.starts_with('?') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    let mut url = Url::parse(&joined)
        .map_err(|e| SourceError::Parse(format!("search url `{joined}`: {e}")))?;

    if !config.search_params.is_empty() {
        let keywords = query.keyword_line();
        let mut pairs = url.query_pairs_mut();
        for param in &config.search_params {
            let value = param
                .value
                .replace("{keywords}", &keywords)
                .replace("{location}", &query.location);
            pairs.append_pair(&param.name, &value);
        }
    }
    Ok(url)
}

fn compile(selector: &str) -> Result<Option<Selector>, SourceError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Ok(None);
    }
    Selector::parse(selector)
        .map(Some)
        .map_err(|e| SourceError::Selector {
            selector: selector.to_string(),
            message: e.to_string(),
        })
}

/// A primary selector and its ordered fallbacks.
struct FieldRule {
    selectors: Vec<Selector>,
}

impl FieldRule {
    fn new(primary: &str, fallbacks: &[String]) -> Result<Self, SourceError> {
        let mut selectors = Vec::new();
        for raw in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
            if let Some(selector) = compile(raw)? {
                selectors.push(selector);
            }
        }
        Ok(Self { selectors })
    }

    /// First non-empty text among the selectors, tried in order.
    fn text(&self, container: ElementRef<'_>) -> String {
        self.selectors
            .iter()
            .filter_map(|selector| container.select(selector).next())
            .map(element_text)
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}

struct CompiledSelectors {
    container: Selector,
    title: FieldRule,
    company: FieldRule,
    location: FieldRule,
    salary: FieldRule,
    description: FieldRule,
    link: Option<Selector>,
}

impl CompiledSelectors {
    fn new(map: &SelectorMap) -> Result<Self, SourceError> {
        let container = compile(&map.job_container)?.ok_or_else(|| SourceError::Selector {
            selector: String::new(),
            message: "job_container selector is empty".into(),
        })?;
        Ok(Self {
            container,
            title: FieldRule::new(&map.title, &map.title_fallback)?,
            company: FieldRule::new(&map.company, &map.company_fallback)?,
            location: FieldRule::new(&map.location, &map.location_fallback)?,
            salary: FieldRule::new(&map.salary, &[])?,
            description: FieldRule::new(&map.description, &[])?,
            link: compile(&map.link)?,
        })
    }

    fn link(&self, container: ElementRef<'_>) -> String {
        let target = match &self.link {
            Some(selector) => container.select(selector).next(),
            None => Some(container),
        };
        target
            .and_then(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default()
    }
}

/// Apply the selector rules to a fetched page, in document order.
pub fn parse_listing(html: &str, selectors: &SelectorMap) -> Result<Vec<RenderedCard>, SourceError> {
    let compiled = CompiledSelectors::new(selectors)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&compiled.container)
        .map(|container| RenderedCard {
            title: compiled.title.text(container),
            company: compiled.company.text(container),
            location: compiled.location.text(container),
            salary: compiled.salary.text(container),
            description: compiled.description.text(container),
            link: compiled.link(container),
        })
        .collect())
}

/// Resolve links, discard cards without title, company or link, apply the cap.
pub fn finish_cards(cards: Vec<RenderedCard>, page_url: &Url, source: &str, cap: usize) -> Vec<RawPosting> {
    cards
        .into_iter()
        .filter(|card| {
            !card.title.trim().is_empty()
                && !card.company.trim().is_empty()
                && !card.link.trim().is_empty()
        })
        .take(cap)
        .map(|card| {
            let link = resolve_link(page_url, &card.link);
            RawPosting::new(card.title, card.company, link, source)
                .with_location(card.location)
                .with_salary(card.salary)
                .with_description(card.description)
        })
        .collect()
}

fn resolve_link(page_url: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    match page_url.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

fn page_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    for (name, value) in [
        ("upgrade-insecure-requests", "1"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

/// Markup extraction strategy. Holds the optional browser renderer; the HTTP
/// client is supplied per call so callers control proxy and user agent.
#[derive(Clone, Default)]
pub struct MarkupExtractor {
    renderer: Option<Arc<dyn BrowserRenderer>>,
}

impl MarkupExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn BrowserRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub async fn extract(
        &self,
        name: &str,
        config: &ScrapeConfig,
        query: &CanonicalQuery,
        http: &HttpClient,
        cap: usize,
    ) -> Result<Vec<RawPosting>, SourceError> {
        let url = build_search_url(config, query)?;

        if requires_browser(name, config) {
            match &self.renderer {
                Some(renderer) => {
                    tracing::info!(source = %name, url = %url, "markup.fetch.browser");
                    let cards = renderer.render(&url, &config.selectors).await?;
                    return Ok(finish_cards(cards, &url, name, cap));
                }
                None => {
                    tracing::warn!(
                        source = %name,
                        "markup.browser.unavailable; falling back to static fetch"
                    );
                }
            }
        }

        tracing::info!(source = %name, url = %url, "markup.fetch.static");
        let response = http
            .get_text(
                url.as_str(),
                RequestOpts {
                    headers: Some(page_headers()),
                    ..Default::default()
                },
            )
            .await?;

        // The final URL after redirects is the base for relative links.
        let cards = parse_listing(&response.body, &config.selectors)?;
        let found = cards.len();
        let postings = finish_cards(cards, &response.url, name, cap);
        tracing::debug!(
            source = %name,
            containers = found,
            kept = postings.len(),
            "markup.parse.complete"
        );
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsift_config::SearchParam;

    const LISTING: &str = r#"
        <html><body>
          <div class="job">
            <h2><a href="/jobs/1">Senior Rust Engineer</a></h2>
            <span class="co">Acme</span>
            <span class="loc">Remote</span>
            <span class="pay">$150k</span>
            <p class="desc">Tokio, Kubernetes</p>
          </div>
          <div class="job">
            <h2 class="alt-title">Backend Developer</h2>
            <span class="employer">Beta Corp</span>
            <a class="apply" href="https://beta.example/apply/2">Apply</a>
          </div>
          <div class="job">
            <h2>No Company Listed</h2>
            <a href="/jobs/3">link</a>
          </div>
        </body></html>
    "#;

    fn selectors() -> SelectorMap {
        SelectorMap {
            job_container: ".job".into(),
            title: "h2 a".into(),
            company: ".co".into(),
            location: ".loc".into(),
            salary: ".pay".into(),
            description: ".desc".into(),
            link: "a".into(),
            title_fallback: vec!["h2".into()],
            company_fallback: vec![".employer".into()],
            location_fallback: vec![],
        }
    }

    fn scrape_config() -> ScrapeConfig {
        ScrapeConfig {
            base_url: "https://board.example/".into(),
            search_path: "/search".into(),
            search_params: vec![
                SearchParam {
                    name: "q".into(),
                    value: "{keywords}".into(),
                },
                SearchParam {
                    name: "where".into(),
                    value: "{location}".into(),
                },
                SearchParam {
                    name: "sort".into(),
                    value: "date".into(),
                },
            ],
            render: RenderMode::Auto,
            selectors: selectors(),
        }
    }

    #[test]
    fn search_url_keeps_param_order_and_encodes() {
        let query = CanonicalQuery::new(["rust", "backend"], "New York");
        let url = build_search_url(&scrape_config(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://board.example/search?q=rust+backend&where=New+York&sort=date"
        );
    }

    #[test]
    fn search_url_without_params_has_no_query() {
        let mut config = scrape_config();
        config.search_params.clear();
        let url = build_search_url(&config, &CanonicalQuery::new(["x"], "")).unwrap();
        assert_eq!(url.as_str(), "https://board.example/search");
    }

    #[test]
    fn fallbacks_links_and_validation() {
        let cards = parse_listing(LISTING, &selectors()).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[1].title, "Backend Developer");
        assert_eq!(cards[1].company, "Beta Corp");

        let page = Url::parse("https://board.example/search?q=rust").unwrap();
        let postings = finish_cards(cards, &page, "board", 10);
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].link, "https://board.example/jobs/1");
        assert_eq!(postings[0].salary, "$150k");
        assert_eq!(postings[1].link, "https://beta.example/apply/2");
        assert_eq!(postings[1].location, "");
    }

    #[test]
    fn cap_truncates_in_document_order() {
        let cards = parse_listing(LISTING, &selectors()).unwrap();
        let page = Url::parse("https://board.example/").unwrap();
        let postings = finish_cards(cards, &page, "board", 1);
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title, "Senior Rust Engineer");
    }

    #[test]
    fn linkless_cards_do_not_take_a_cap_slot() {
        let mut cards = parse_listing(LISTING, &selectors()).unwrap();
        cards[0].link.clear();
        let page = Url::parse("https://board.example/").unwrap();
        let postings = finish_cards(cards, &page, "board", 1);
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title, "Backend Developer");
    }

    #[test]
    fn invalid_selector_is_reported() {
        let mut map = selectors();
        map.company = "div[".into();
        let err = parse_listing(LISTING, &map).unwrap_err();
        assert!(matches!(err, SourceError::Selector { ref selector, .. } if selector == "div["));
    }

    #[test]
    fn browser_heuristics_follow_name_and_url() {
        let mut config = scrape_config();
        assert!(!requires_browser("smallboard", &config));
        assert!(requires_browser("LinkedIn Jobs", &config));
        config.base_url = "https://careers.acme.com".into();
        assert!(requires_browser("acme", &config));
        config.render = RenderMode::Static;
        assert!(!requires_browser("linkedin", &config));
    }
}
