use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jobsift_common::{CanonicalQuery, SourceError};
use jobsift_config::{
    FeedConfig, FeedType, RenderMode, ScrapeConfig, SearchParam, SelectorMap,
};
use jobsift_http::{ClientOptions, HttpClient};
use jobsift_web::{BrowserRenderer, FeedExtractor, MarkupExtractor, RenderedCard};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = r#"<html><body>
  <ul>
    <li class="result"><a class="t" href="/view/1">Rust Engineer</a><span class="c">Acme</span><span class="l">Remote</span></li>
    <li class="result"><a class="t" href="/view/2">Go Engineer</a><span class="c">Beta</span></li>
    <li class="result"><a class="t" href="/view/3">Untitled</a></li>
  </ul>
</body></html>"#;

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>Rust Developer at Ferrous Labs</title><link>https://f.example/1</link><description>Embedded work in Berlin</description></item>
  <item><title>Java Developer at Beans Inc</title><link>https://f.example/2</link><description>Spring</description></item>
  <item><title>Rust Intern at Crab Co</title><link>https://f.example/3</link><description>Unpaid internship</description></item>
</channel></rss>"#;

fn client() -> HttpClient {
    HttpClient::unanchored(ClientOptions::default())
        .unwrap()
        .with_retries(0)
}

fn scrape_config(server: &MockServer, render: RenderMode) -> ScrapeConfig {
    ScrapeConfig {
        base_url: server.uri(),
        search_path: "/jobs".into(),
        search_params: vec![SearchParam {
            name: "q".into(),
            value: "{keywords}".into(),
        }],
        render,
        selectors: SelectorMap {
            job_container: "li.result".into(),
            title: "a.t".into(),
            company: ".c".into(),
            location: ".l".into(),
            link: "a.t".into(),
            ..SelectorMap::default()
        },
    }
}

#[tokio::test]
async fn static_listing_is_extracted_with_absolute_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("q", "rust go"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let query = CanonicalQuery::new(["rust", "go"], "Remote");
    let postings = MarkupExtractor::new()
        .extract(
            "board",
            &scrape_config(&server, RenderMode::Static),
            &query,
            &client(),
            10,
        )
        .await
        .unwrap();

    assert_eq!(postings.len(), 2);
    assert_eq!(postings[0].title, "Rust Engineer");
    assert_eq!(postings[0].link, format!("{}/view/1", server.uri()));
    assert_eq!(postings[0].location, "Remote");
    assert_eq!(postings[1].company, "Beta");
    assert!(postings.iter().all(|p| p.source == "board"));
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = MarkupExtractor::new()
        .extract(
            "board",
            &scrape_config(&server, RenderMode::Static),
            &CanonicalQuery::new(["rust"], ""),
            &client(),
            10,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 503, .. }));
}

struct StubRenderer {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl BrowserRenderer for StubRenderer {
    async fn render(
        &self,
        url: &Url,
        _selectors: &SelectorMap,
    ) -> Result<Vec<RenderedCard>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(url.as_str().contains("q=rust"));
        Ok(vec![RenderedCard {
            title: "Rendered Role".into(),
            company: "Scripted Inc".into(),
            link: "/r/1".into(),
            ..RenderedCard::default()
        }])
    }
}

#[tokio::test]
async fn browser_sources_use_the_renderer_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(0)
        .mount(&server)
        .await;

    let renderer = Arc::new(StubRenderer {
        calls: AtomicUsize::new(0),
    });
    let extractor = MarkupExtractor::new().with_renderer(renderer.clone());
    let postings = extractor
        .extract(
            "board",
            &scrape_config(&server, RenderMode::Browser),
            &CanonicalQuery::new(["rust"], ""),
            &client(),
            10,
        )
        .await
        .unwrap();

    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].link, format!("{}/r/1", server.uri()));
}

#[tokio::test]
async fn browser_sources_fall_back_to_static_without_renderer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let postings = MarkupExtractor::new()
        .extract(
            "board",
            &scrape_config(&server, RenderMode::Browser),
            &CanonicalQuery::new(["rust"], ""),
            &client(),
            1,
        )
        .await
        .unwrap();
    assert_eq!(postings.len(), 1);
}

#[tokio::test]
async fn feed_filters_on_feed_and_query_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs.rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(RSS),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = FeedConfig {
        feed_url: format!("{}/jobs.rss", server.uri()),
        feed_type: FeedType::Rss,
        keywords: vec!["embedded".into()],
        exclude_words: vec!["unpaid".into()],
    };
    let postings = FeedExtractor::new()
        .extract("feed", &config, &CanonicalQuery::new(["rust"], ""), &client(), 10)
        .await
        .unwrap();

    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].company, "Ferrous Labs");
    assert_eq!(postings[0].location, "Berlin");
    assert_eq!(postings[0].link, "https://f.example/1");
}
