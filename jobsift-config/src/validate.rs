use std::collections::HashSet;

use url::Url;

use crate::ConfigLoadError;
use crate::schema::{JobsiftConfig, ProviderKind, SourceKind};

const EXPORT_FORMATS: &[&str] = &["csv", "json"];

/// Reject documents that cannot drive a run. Every problem found is reported.
pub(crate) fn validate(config: &JobsiftConfig) -> Result<(), ConfigLoadError> {
    let mut problems = Vec::new();

    let mut names = HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            problems.push("source with empty name".to_string());
        } else if !names.insert(source.name.as_str()) {
            problems.push(format!("duplicate source name `{}`", source.name));
        }

        match &source.kind {
            SourceKind::Scrape { config: scrape } => {
                check_endpoint(&mut problems, &source.name, "base_url", &scrape.base_url);
                if scrape.selectors.job_container.trim().is_empty() {
                    problems.push(format!("{}: selectors.job_container is required", source.name));
                }
                if scrape.selectors.title.trim().is_empty() {
                    problems.push(format!("{}: selectors.title is required", source.name));
                }
            }
            SourceKind::Feed { config: feed } => {
                check_endpoint(&mut problems, &source.name, "feed_url", &feed.feed_url);
            }
        }
    }

    let mut provider_names = HashSet::new();
    for provider in &config.api_providers {
        if provider.name.trim().is_empty() {
            problems.push("api provider with empty name".to_string());
        } else if !provider_names.insert(provider.name.as_str()) {
            problems.push(format!("duplicate api provider name `{}`", provider.name));
        }
        if let Some(base) = &provider.base_url {
            check_endpoint(&mut problems, &provider.name, "base_url", base);
        }
        if provider.provider == ProviderKind::Generic {
            if provider.base_url.is_none() {
                problems.push(format!("{}: generic providers need a base_url", provider.name));
            }
            match &provider.generic {
                Some(generic) if !generic.fields.title.trim().is_empty() => {}
                _ => problems.push(format!(
                    "{}: generic providers need a field map with at least `title`",
                    provider.name
                )),
            }
        }
    }

    let global = &config.global;
    if global.delay.min_ms > global.delay.max_ms {
        problems.push(format!(
            "delay.min_ms ({}) exceeds delay.max_ms ({})",
            global.delay.min_ms, global.delay.max_ms
        ));
    }
    for proxy in &global.proxy.proxies {
        if Url::parse(proxy).is_err() {
            problems.push(format!("invalid proxy url `{proxy}`"));
        }
    }
    for format in &global.export_formats {
        if !EXPORT_FORMATS.contains(&format.to_ascii_lowercase().as_str()) {
            problems.push(format!("unsupported export format `{format}`"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigLoadError::Invalid(problems.join("; ")))
    }
}

fn check_endpoint(problems: &mut Vec<String>, owner: &str, field: &str, raw: &str) {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => problems.push(format!(
            "{owner}: {field} `{raw}` must use http or https (got `{}`)",
            url.scheme()
        )),
        Err(e) => problems.push(format!("{owner}: {field} `{raw}` is not a valid url: {e}")),
    }
}
