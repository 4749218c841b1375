mod common;

use std::time::Duration;

use jobsift_common::{CanonicalQuery, JobsiftError};
use jobsift_config::{
    ApiProviderConfig, AuthStyle, DelaySettings, FeedConfig, FeedType, GenericApiConfig,
    GenericFieldMap, GlobalSettings, JobsiftConfig, ProviderKind, ProxySettings, RateLimitConfig,
    RenderMode, ScrapeConfig, SearchParam, SelectorMap, SourceDescriptor, SourceKind,
};
use jobsift_engine::{Aggregator, OutcomeStatus, Phase, ProviderRegistry};
use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing(jobs: &[(&str, &str)]) -> String {
    let cards: String = jobs
        .iter()
        .enumerate()
        .map(|(i, (title, company))| {
            format!(
                r#"<div class="job"><a class="t" href="/view/{i}">{title}</a><span class="c">{company}</span></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn global() -> GlobalSettings {
    GlobalSettings {
        timeout_ms: 300,
        retry_attempts: 0,
        run_timeout_secs: 10,
        delay: DelaySettings { min_ms: 0, max_ms: 0 },
        ..GlobalSettings::default()
    }
}

fn scrape(name: &str, server: &MockServer, route: &str) -> SourceDescriptor {
    SourceDescriptor {
        name: name.into(),
        enabled: true,
        rate_limit_ms: 0,
        max_results: None,
        kind: SourceKind::Scrape {
            config: ScrapeConfig {
                base_url: server.uri(),
                search_path: route.into(),
                search_params: vec![SearchParam {
                    name: "q".into(),
                    value: "{keywords}".into(),
                }],
                render: RenderMode::Static,
                selectors: SelectorMap {
                    job_container: ".job".into(),
                    title: "a.t".into(),
                    company: ".c".into(),
                    link: "a.t".into(),
                    ..SelectorMap::default()
                },
            },
        },
    }
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_failing_source_does_not_sink_the_run() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(
        &server,
        "/a",
        ResponseTemplate::new(200).set_body_string(listing(&[
            ("Rust Engineer", "Acme"),
            ("Python Developer", "Beta"),
            ("Go Engineer", "Gamma"),
        ])),
    )
    .await;
    serve(
        &server,
        "/b",
        ResponseTemplate::new(200)
            .set_body_string(listing(&[("Late", "Slow Co")]))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    serve(&server, "/c", ResponseTemplate::new(200).set_body_string(listing(&[]))).await;

    let sources = vec![
        scrape("a", &server, "/a"),
        scrape("b", &server, "/b"),
        scrape("c", &server, "/c"),
    ];
    let aggregator = Aggregator::new(global(), sources, ProviderRegistry::new());
    let result = aggregator
        .run(&CanonicalQuery::new(["rust", "python"], "Remote"))
        .await
        .unwrap();

    assert_eq!(result.postings.len(), 3);
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("b: "));

    let c = result.outcomes.iter().find(|o| o.source == "c").unwrap();
    assert_eq!(c.status, OutcomeStatus::Jobs(0));
    assert!(result.outcomes.iter().all(|o| o.phase == Phase::Markup));

    let rust = result
        .postings
        .iter()
        .find(|p| p.title == "Rust Engineer")
        .unwrap();
    assert_eq!(rust.relevance, 1.0);
    assert_eq!(rust.link, format!("{}/view/0", server.uri()));
}

#[tokio::test]
async fn every_source_failing_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(&server, "/a", ResponseTemplate::new(500).set_body_string("down")).await;
    serve(&server, "/b", ResponseTemplate::new(404).set_body_string("gone")).await;

    let sources = vec![scrape("a", &server, "/a"), scrape("b", &server, "/b")];
    let aggregator = Aggregator::new(global(), sources, ProviderRegistry::new());
    let err = aggregator
        .run(&CanonicalQuery::new(["rust"], ""))
        .await
        .unwrap_err();

    match err {
        JobsiftError::AllSourcesFailed(message) => {
            assert!(message.contains("a: "));
            assert!(message.contains("b: "));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_sources_are_not_failures() {
    let server = MockServer::start().await;
    serve(&server, "/c", ResponseTemplate::new(200).set_body_string(listing(&[]))).await;

    let aggregator = Aggregator::new(
        global(),
        vec![scrape("c", &server, "/c")],
        ProviderRegistry::new(),
    );
    let result = aggregator.run(&CanonicalQuery::new(["rust"], "")).await.unwrap();
    assert!(result.postings.is_empty());
    assert!(result.diagnostics().is_empty());
}

fn generic_provider(name: &str, server: &MockServer, key: &str) -> ApiProviderConfig {
    let mut config = ApiProviderConfig::new(name, ProviderKind::Generic);
    config.api_key = key.into();
    config.base_url = Some(server.uri());
    config.rate_limit = RateLimitConfig {
        cooldown_ms: 0,
        ..RateLimitConfig::default()
    };
    config.generic = Some(GenericApiConfig {
        search_path: "/v1/jobs".into(),
        results_pointer: "/items".into(),
        keywords_param: Some("q".into()),
        auth: AuthStyle::Bearer,
        fields: GenericFieldMap {
            title: "/title".into(),
            company: Some("/company".into()),
            link: Some("/href".into()),
            description: Some("/body".into()),
            ..GenericFieldMap::default()
        },
        ..GenericApiConfig::default()
    });
    config
}

#[tokio::test]
async fn api_results_win_dedup_and_feeds_score_on_their_own_keywords() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "title": "Rust Engineer", "company": "Acme",
                "href": "https://acme.dev/jobs/1", "body": "Tokio services"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    serve(
        &server,
        "/board",
        ResponseTemplate::new(200)
            .set_body_string(listing(&[("rust engineer", "ACME"), ("Data Engineer", "Beta")])),
    )
    .await;
    serve(
        &server,
        "/jobs.rss",
        ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?><rss version="2.0"><channel>
              <item><title>Embedded Developer at Crab Co</title><link>https://crab.example/1</link>
                <description>Firmware in Rust</description></item>
            </channel></rss>"#,
        ),
    )
    .await;

    let feed = SourceDescriptor {
        name: "feed".into(),
        enabled: true,
        rate_limit_ms: 0,
        max_results: None,
        kind: SourceKind::Feed {
            config: FeedConfig {
                feed_url: format!("{}/jobs.rss", server.uri()),
                feed_type: FeedType::Rss,
                keywords: vec!["embedded".into()],
                exclude_words: vec![],
            },
        },
    };

    let config = JobsiftConfig {
        version: None,
        global: global(),
        sources: vec![scrape("board", &server, "/board"), feed],
        api_providers: vec![
            generic_provider("acme-api", &server, "secret"),
            generic_provider("keyless-api", &server, ""),
        ],
    };
    let aggregator = Aggregator::from_config(&config).await.unwrap();
    let result = aggregator
        .run(&CanonicalQuery::new(["rust"], ""))
        .await
        .unwrap();

    assert_eq!(result.postings.len(), 3);
    assert_eq!(result.postings[0].source, "acme-api");
    assert_eq!(result.postings[0].link, "https://acme.dev/jobs/1");
    assert!(result.postings.iter().all(|p| p.source != "board" || p.title != "rust engineer"));

    // Feed postings are scored against feed keywords plus the query.
    let embedded = result.postings.iter().find(|p| p.source == "feed").unwrap();
    assert_eq!(embedded.company, "Crab Co");
    assert_eq!(embedded.relevance, 1.5);

    assert!(result.outcomes.iter().all(|o| o.source != "keyless-api"));
    let api = result.outcomes.iter().find(|o| o.source == "acme-api").unwrap();
    assert_eq!(api.phase, Phase::Api);

    let stats = aggregator.registry().stats().await;
    assert_eq!(stats["acme-api"].total_requests, 1);
    assert_eq!(stats["keyless-api"].total_requests, 0);
}

#[tokio::test]
async fn startup_drops_proxies_that_fail_the_health_check() {
    common::init_test_tracing();
    // Answers any proxied request.
    let proxy = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"origin":"10.0.0.1"}"#))
        .mount(&proxy)
        .await;
    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let config = JobsiftConfig {
        version: None,
        global: GlobalSettings {
            proxy: ProxySettings {
                enabled: true,
                proxies: vec![dead, proxy.uri()],
                timeout_secs: 1,
                health_check_url: "http://health.jobsift.test/ip".into(),
                ..ProxySettings::default()
            },
            ..global()
        },
        sources: vec![],
        api_providers: vec![],
    };
    let aggregator = Aggregator::from_config(&config).await.unwrap();

    let pool = aggregator.identity().proxies();
    assert_eq!(pool.len().await, 1);
    assert_eq!(pool.next().await, Some(format!("{}/", proxy.uri())));
}
