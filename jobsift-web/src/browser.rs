use std::time::Duration;

use anyhow::Context;
use jobsift_common::SourceError;
use jobsift_config::{BrowserSettings, SelectorMap, StealthLevel};
use jobsift_drivers::browser::driver::BrowserDriver;
use jobsift_drivers::browser::stealth::StealthProfile;
use serde::Deserialize;
use url::Url;

/// Field values read from one job container, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderedCard {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub link: String,
}

/// Scripted-browser rendering path for client-rendered boards.
///
/// The same selector rules as the static path are evaluated in the live DOM.
#[async_trait::async_trait]
pub trait BrowserRenderer: Send + Sync {
    async fn render(&self, url: &Url, selectors: &SelectorMap)
    -> Result<Vec<RenderedCard>, SourceError>;
}

const EXTRACT_SCRIPT: &str = r#"
const sel = arguments[0];
const pick = (root, selectors, attr) => {
  for (const s of selectors) {
    if (!s) continue;
    const el = root.querySelector(s);
    if (!el) continue;
    const v = attr ? (el.href || el.getAttribute(attr) || '') : (el.textContent || '');
    if (v.trim()) return v.replace(/\s+/g, ' ').trim();
  }
  return '';
};
return Array.from(document.querySelectorAll(sel.job_container)).map(c => ({
  title: pick(c, [sel.title, ...sel.title_fallback]),
  company: pick(c, [sel.company, ...sel.company_fallback]),
  location: pick(c, [sel.location, ...sel.location_fallback]),
  salary: pick(c, [sel.salary]),
  description: pick(c, [sel.description]),
  link: pick(c, [sel.link], 'href') || c.href || c.getAttribute('href') || '',
}));
"#;

/// [`BrowserRenderer`] over a WebDriver session, one session per render.
#[derive(Debug, Clone)]
pub struct FantocciniRenderer {
    webdriver_url: String,
    headless: bool,
    profile: StealthProfile,
    settle: Duration,
    wait: Duration,
}

impl FantocciniRenderer {
    pub fn from_settings(settings: &BrowserSettings, wait: Duration) -> Self {
        let profile = match settings.stealth {
            StealthLevel::Lightweight => StealthProfile::Lightweight,
            StealthLevel::Balanced => StealthProfile::Balanced,
            StealthLevel::Maximum => StealthProfile::Maximum,
        };
        Self {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            profile,
            settle: Duration::from_millis(settings.settle_ms),
            wait,
        }
    }

    async fn render_with(
        &self,
        driver: &BrowserDriver,
        url: &Url,
        selectors: &SelectorMap,
    ) -> anyhow::Result<Vec<RenderedCard>> {
        let page = driver.goto(url.as_str()).await?;
        page.wait_for(&selectors.job_container, self.wait).await?;
        page.settle(self.settle).await;
        let args = serde_json::to_value(selectors).context("serialize selectors")?;
        let value = page.evaluate(EXTRACT_SCRIPT, vec![args]).await?;
        serde_json::from_value(value).context("unexpected extraction result shape")
    }
}

#[async_trait::async_trait]
impl BrowserRenderer for FantocciniRenderer {
    async fn render(
        &self,
        url: &Url,
        selectors: &SelectorMap,
    ) -> Result<Vec<RenderedCard>, SourceError> {
        let driver = BrowserDriver::connect(&self.webdriver_url, self.headless, self.profile)
            .await
            .map_err(SourceError::Browser)?;
        let result = self.render_with(&driver, url, selectors).await;
        if let Err(e) = driver.close().await {
            tracing::debug!(error = %e, "browser.session.close_failed");
        }
        let cards = result.map_err(SourceError::Browser)?;
        tracing::debug!(url = %url, cards = cards.len(), "browser.render.complete");
        Ok(cards)
    }
}
