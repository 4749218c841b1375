//! Aggregation engine: pacing, outbound identity, the provider registry and
//! the two-phase orchestrator that merges everything into one result.
//!
//! ```no_run
//! # async fn demo() -> Result<(), jobsift_common::JobsiftError> {
//! use jobsift_common::CanonicalQuery;
//! use jobsift_config::JobsiftConfigLoader;
//! use jobsift_engine::Aggregator;
//!
//! let config = JobsiftConfigLoader::new()
//!     .with_file("config/sources.yaml")
//!     .load()
//!     .map_err(|e| jobsift_common::JobsiftError::Config(e.to_string()))?;
//! let aggregator = Aggregator::from_config(&config).await?;
//! let result = aggregator.run(&CanonicalQuery::new(["rust"], "Remote")).await?;
//! for warning in result.diagnostics() {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(()) }
//! ```
pub mod identity;
pub mod orchestrator;
pub mod rate;
pub mod registry;

pub use identity::{IdentityManager, Lease, ProxyPool, UserAgentPool};
pub use orchestrator::{Aggregator, OutcomeStatus, Phase, RunResult, SourceOutcome};
pub use rate::{Pacer, RateManager};
pub use registry::{ProviderRegistry, ProviderStats, RegistryError};
