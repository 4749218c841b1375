//! Plain-text run reports printed to stdout.

use std::collections::HashMap;
use std::fmt::Write;

use jobsift_common::JobPosting;
use jobsift_engine::{OutcomeStatus, ProviderStats, RunResult, SourceOutcome};
use jobsift_store::{JobStats, StoreReport};

pub fn run_summary(result: &RunResult, saved: &StoreReport, stats: &JobStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run summary");
    let _ = writeln!(
        out,
        "  found {} postings ({} new, {} updated)",
        result.postings.len(),
        saved.inserted,
        saved.updated
    );
    let failures = result.diagnostics();
    if !failures.is_empty() {
        let _ = writeln!(out, "  {} source(s) failed:", failures.len());
        for line in &failures {
            let _ = writeln!(out, "    {line}");
        }
    }

    let _ = writeln!(
        out,
        "Stored: {} total, {} in the last 24h",
        stats.total_jobs, stats.recent_jobs
    );
    let _ = writeln!(out, "By source:");
    for (source, n) in &stats.jobs_by_source {
        let _ = writeln!(out, "  {source}: {n}");
    }
    let _ = writeln!(out, "Top locations:");
    for (location, n) in stats.top_locations(5) {
        let _ = writeln!(out, "  {location}: {n}");
    }
    let _ = write!(out, "Top keywords:");
    for (keyword, n) in stats.top_keywords(10) {
        let _ = write!(out, "\n  {keyword}: {n}");
    }
    out
}

/// Most recently scraped postings first.
pub fn recent_jobs(postings: &[JobPosting], limit: usize) -> String {
    if postings.is_empty() {
        return "No postings stored yet.".to_string();
    }
    let mut recent: Vec<&JobPosting> = postings.iter().collect();
    recent.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));

    let mut out = String::from("Recent jobs:");
    for p in recent.into_iter().take(limit) {
        let _ = write!(out, "\n  {} @ {}", p.title, p.company);
        if !p.location.is_empty() {
            let _ = write!(out, " ({})", p.location);
        }
        let _ = write!(out, " [{}, {:.2}]\n    {}", p.source, p.relevance, p.link);
    }
    out
}

pub fn outcomes(outcomes: &[SourceOutcome]) -> String {
    let mut out = String::from("Sources:");
    for o in outcomes {
        let status = match &o.status {
            OutcomeStatus::Jobs(n) => format!("{n} jobs"),
            OutcomeStatus::Failed(message) => format!("failed: {message}"),
        };
        let _ = write!(
            out,
            "\n  [{}] {}: {} in {}ms",
            o.phase,
            o.source,
            status,
            o.elapsed.as_millis()
        );
    }
    out
}

pub fn provider_stats(stats: &HashMap<String, ProviderStats>) -> String {
    let mut names: Vec<&String> = stats.keys().collect();
    names.sort();
    let mut out = String::from("Providers:");
    for name in names {
        let s = &stats[name];
        let _ = write!(
            out,
            "\n  {name}: {} requests ({} ok, {} failed), {} jobs, avg {}ms",
            s.total_requests,
            s.successful_requests,
            s.failed_requests,
            s.total_jobs,
            s.average_latency.as_millis()
        );
    }
    out
}
