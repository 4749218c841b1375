//! Persistence, filtering, statistics and export for aggregated postings.
//!
//! The engine hands merged [`JobPosting`](jobsift_common::JobPosting)s to a
//! [`Storage`] implementation; [`Exporter`] turns a snapshot into CSV or JSON.

pub mod export;
pub mod filter;
pub mod stats;
pub mod storage;

pub use export::{ExportFormat, Exporter};
pub use filter::{parse_salary, JobFilter};
pub use stats::JobStats;
pub use storage::{FileStore, Storage, StoreReport};
