use jobsift_common::SourceError;
use jobsift_config::{
    ApiProviderConfig, AuthStyle, GenericApiConfig, GenericFieldMap, GlobalSettings, ProviderKind,
};
use jobsift_providers::{build_provider, ProviderQuery};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(server: &MockServer, kind: ProviderKind, route: &str) -> ApiProviderConfig {
    let mut config = ApiProviderConfig::new(kind.id(), kind);
    config.api_key = "test-key".into();
    config.base_url = Some(format!("{}{route}", server.uri()));
    config.timeout_secs = 5;
    config
}

fn quiet_global() -> GlobalSettings {
    GlobalSettings {
        retry_attempts: 0,
        ..GlobalSettings::default()
    }
}

#[tokio::test]
async fn reed_sends_basic_auth_and_maps_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/search"))
        .and(query_param("keywords", "rust developer"))
        .and(query_param("locationName", "Leeds"))
        .and(query_param("resultsToTake", "10"))
        // base64("test-key:")
        .and(header("authorization", "Basic dGVzdC1rZXk6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "jobId": 1, "employerName": "Acme", "jobTitle": "Rust Developer",
                "locationName": "Leeds", "jobUrl": "https://www.reed.co.uk/jobs/1",
                "jobDescription": "Async Rust", "minimumSalary": 50000.0
            }],
            "totalResults": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = provider_config(&server, ProviderKind::Reed, "/api/1.0/search");
    let reed = build_provider(&config, &quiet_global()).unwrap();
    let page = reed
        .search(&ProviderQuery::new(["rust", "developer"], "Leeds", 10))
        .await
        .unwrap();

    assert_eq!(page.provider, "reed");
    assert_eq!(page.postings.len(), 1);
    assert_eq!(page.postings[0].salary, "£50000+ per year");
    assert_eq!(page.postings[0].source, "reed");
    assert!(!page.has_more);
}

#[tokio::test]
async fn usajobs_uses_authorization_key_and_configured_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Search"))
        .and(header("authorization-key", "test-key"))
        .and(header("user-agent", "jobs@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SearchResult": {"SearchResultCountAll": 0, "SearchResultItems": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = provider_config(&server, ProviderKind::Usajobs, "/api/Search");
    config
        .headers
        .insert("User-Agent".into(), "jobs@example.com".into());
    let usajobs = build_provider(&config, &quiet_global()).unwrap();
    let page = usajobs
        .search(&ProviderQuery::new(["analyst"], "", 25))
        .await
        .unwrap();
    assert!(page.postings.is_empty());
}

#[tokio::test]
async fn jsearch_error_status_fails_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("x-rapidapi-key", "test-key"))
        .and(header_exists("x-rapidapi-host"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ERROR", "data": []})),
        )
        .mount(&server)
        .await;

    let config = provider_config(&server, ProviderKind::Jsearch, "/search");
    let jsearch = build_provider(&config, &quiet_global()).unwrap();
    let err = jsearch
        .search(&ProviderQuery::new(["go"], "Berlin", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Parse(ref m) if m.contains("API returned error")));
}

#[tokio::test]
async fn upstream_errors_surface_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad key"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = provider_config(&server, ProviderKind::Reed, "/api/1.0/search");
    let reed = build_provider(&config, &quiet_global()).unwrap();
    let err = reed.validate_credentials().await.unwrap_err();
    match err {
        SourceError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unconfigured_provider_never_calls_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = provider_config(&server, ProviderKind::Reed, "/api/1.0/search");
    config.api_key.clear();
    let reed = build_provider(&config, &quiet_global()).unwrap();
    let err = reed
        .search(&ProviderQuery::new(["rust"], "", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NotConfigured(_)));
}

#[tokio::test]
async fn generic_provider_follows_field_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .and(query_param("q", "rust"))
        .and(query_param("limit", "3"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "Rust Engineer", "company": "Acme", "href": "https://acme.dev/1"},
                {"title": "Embedded Rust", "company": "Beta", "href": "https://beta.dev/2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ApiProviderConfig::new("acme", ProviderKind::Generic);
    config.api_key = "test-key".into();
    config.base_url = Some(server.uri());
    config.max_results = 3;
    config.generic = Some(GenericApiConfig {
        search_path: "/v1/jobs".into(),
        results_pointer: "/items".into(),
        keywords_param: Some("q".into()),
        limit_param: Some("limit".into()),
        auth: AuthStyle::Bearer,
        fields: GenericFieldMap {
            title: "/title".into(),
            company: Some("/company".into()),
            link: Some("/href".into()),
            ..GenericFieldMap::default()
        },
        ..GenericApiConfig::default()
    });

    let acme = build_provider(&config, &quiet_global()).unwrap();
    // Caller asks for more than the provider allows; the limit is clamped.
    let page = acme
        .search(&ProviderQuery::new(["rust"], "", 50))
        .await
        .unwrap();
    assert_eq!(page.per_page, 3);
    assert_eq!(page.postings.len(), 2);
    assert!(page.postings.iter().all(|p| p.is_complete()));
}
