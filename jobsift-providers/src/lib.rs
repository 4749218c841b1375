//! Structured-API extraction strategy.
//!
//! Every API is a [`JobApiProvider`]. The typed adapters ([`reed`], [`usajobs`],
//! [`jsearch`]) each describe their request and response shape through
//! [`ApiSchema`] and share nothing but the HTTP client; [`generic`] covers
//! APIs that are only described in configuration.
//!
//! ```no_run
//! # async fn demo() -> Result<(), jobsift_common::SourceError> {
//! use jobsift_config::{ApiProviderConfig, GlobalSettings, ProviderKind};
//! use jobsift_providers::{build_provider, ProviderQuery};
//!
//! let mut config = ApiProviderConfig::new("reed", ProviderKind::Reed);
//! config.api_key = std::env::var("REED_API_KEY").unwrap_or_default();
//!
//! let reed = build_provider(&config, &GlobalSettings::default())?;
//! let page = reed.search(&ProviderQuery::new(["rust"], "London", 20)).await?;
//! println!("{} of {} postings", page.postings.len(), page.total);
//! # Ok(()) }
//! ```
mod factory;
pub mod generic;
pub mod jsearch;
mod provider;
mod query;
pub mod reed;
pub mod usajobs;

pub use factory::build_provider;
pub use provider::{ApiProvider, ApiSchema, JobApiProvider, ProviderRateLimit, ProviderRequest};
pub use query::{DatePosted, JobType, ProviderQuery, SalaryFilter, SearchPage};
