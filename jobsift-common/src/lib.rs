//! Common types and utilities shared across Jobsift crates.
//!
//! This crate defines the posting model, the canonical query, the relevance and
//! identity rules, observability helpers, and the shared error types used
//! throughout the workspace. Every other crate depends on it, so it stays free of
//! network and runtime dependencies.
//!
//! # Overview
//!
//! - [`JobPosting`] / [`RawPosting`]: the canonical record and its pre-validation candidate
//! - [`CanonicalQuery`] and [`query::KeywordProcessor`]: the normalized search
//! - [`relevance`]: fingerprinting, scoring, keyword extraction and dedup
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`SourceError`], [`JobsiftError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use jobsift_common::{CanonicalQuery, RawPosting};
//!
//! let query = CanonicalQuery::new(["rust", "backend"], "Remote");
//! let mut posting = RawPosting::new("Rust Backend Engineer", "Acme", "https://acme.dev/jobs/1", "acme-board")
//!     .into_posting()
//!     .expect("complete posting");
//!
//! posting.score(&query.keywords);
//! assert_eq!(posting.relevance, 2.0);
//! ```

pub mod observability;
pub mod posting;
pub mod query;
pub mod relevance;

pub use posting::{ExperienceLevel, JobPosting, RawPosting};
pub use query::CanonicalQuery;

/// Failure scoped to a single source or provider.
///
/// The orchestrator records these as diagnostics; they never abort sibling
/// sources.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Connection, DNS, TLS or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// HTML, XML or JSON could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// A configured CSS selector does not compile.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// The scripted browser failed to render or evaluate the page.
    #[error("browser error: {0}")]
    Browser(#[from] anyhow::Error),

    /// Missing credentials or required settings.
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,
}

/// Error types used across the Jobsift system.
#[derive(thiserror::Error, Debug)]
pub enum JobsiftError {
    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single named source failed.
    #[error("{name}: {error}")]
    Source { name: String, error: SourceError },

    /// Aggregation produced no postings and at least one diagnostic.
    #[error("all sources failed: {0}")]
    AllSourcesFailed(String),

    /// The storage collaborator could not read or persist postings.
    #[error("storage error: {0}")]
    Storage(String),

    /// The export collaborator could not produce its output.
    #[error("export error: {0}")]
    Export(String),

    /// An export or display step was asked to work on an empty set.
    #[error("no postings found")]
    NoPostings,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operation exceeded the configured timeout.
    #[error("timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`JobsiftError`].
pub type Result<T> = std::result::Result<T, JobsiftError>;
