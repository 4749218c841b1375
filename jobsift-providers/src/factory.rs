use std::sync::Arc;

use jobsift_common::SourceError;
use jobsift_config::{ApiProviderConfig, GlobalSettings, ProviderKind};

use crate::generic::GenericSchema;
use crate::jsearch::JSearch;
use crate::provider::{ApiProvider, JobApiProvider};
use crate::reed::Reed;
use crate::usajobs::UsaJobs;

/// Build the adapter named by `config.provider`.
///
/// ```
/// use jobsift_config::{ApiProviderConfig, GlobalSettings, ProviderKind};
///
/// let mut config = ApiProviderConfig::new("reed-uk", ProviderKind::Reed);
/// let provider = jobsift_providers::build_provider(&config, &GlobalSettings::default()).unwrap();
/// assert_eq!(provider.name(), "reed-uk");
/// assert!(!provider.is_configured());
///
/// config.api_key = "key".into();
/// let provider = jobsift_providers::build_provider(&config, &GlobalSettings::default()).unwrap();
/// assert!(provider.is_configured());
/// ```
pub fn build_provider(
    config: &ApiProviderConfig,
    global: &GlobalSettings,
) -> Result<Arc<dyn JobApiProvider>, SourceError> {
    let config = config.clone();
    let provider: Arc<dyn JobApiProvider> = match config.provider {
        ProviderKind::Reed => Arc::new(ApiProvider::new(Reed, config, global)?),
        ProviderKind::Usajobs => Arc::new(ApiProvider::new(UsaJobs, config, global)?),
        ProviderKind::Jsearch => Arc::new(ApiProvider::new(JSearch, config, global)?),
        ProviderKind::Generic => {
            let Some(generic) = config.generic.clone() else {
                return Err(SourceError::NotConfigured(format!(
                    "{}: generic provider without a field map",
                    config.name
                )));
            };
            if config.base_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
                return Err(SourceError::NotConfigured(format!(
                    "{}: generic provider without a base_url",
                    config.name
                )));
            }
            Arc::new(ApiProvider::new(GenericSchema::new(generic), config, global)?)
        }
    };
    Ok(provider)
}
