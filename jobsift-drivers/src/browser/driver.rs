use crate::browser::{
    behavioral::BehavioralEngine,
    fingerprint::{UserAgentManager, UserAgentProfile},
    page::BrowserPage,
    stealth::{build_stealth_arguments, StealthProfile},
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use webdriver::capabilities::Capabilities;

#[cfg(feature = "chromium")]
const OPTIONS_KEY: &str = "goog:chromeOptions";
#[cfg(not(feature = "chromium"))]
const OPTIONS_KEY: &str = "moz:firefoxOptions";

/// Thin wrapper around a `fantoccini` WebDriver session with stealth and
/// behavioral helpers.
pub struct BrowserDriver {
    client: Client,
    behavioral_engine: BehavioralEngine,
    session_profile: UserAgentProfile,
    stealth_profile: StealthProfile,
}

impl BrowserDriver {
    /// Connect to a running WebDriver service (e.g. chromedriver on
    /// `http://localhost:9515`).
    pub async fn connect(
        webdriver_url: &str,
        headless: bool,
        stealth_profile: StealthProfile,
    ) -> Result<Self> {
        let session_profile = UserAgentManager::new().session_profile();
        let mut args = build_stealth_arguments(stealth_profile, &session_profile);
        if headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        }

        let mut caps = Capabilities::new();
        caps.insert(OPTIONS_KEY.to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .with_context(|| format!("failed to connect to webdriver at {webdriver_url}"))?;

        tracing::debug!(
            webdriver = %webdriver_url,
            headless,
            profile = ?stealth_profile,
            user_agent = %session_profile.user_agent,
            "browser.session.start"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            session_profile,
            stealth_profile,
        })
    }

    /// Navigate to `url` and return a [`BrowserPage`] with stealth scripts applied.
    pub async fn goto(&self, url: &str) -> Result<BrowserPage> {
        let page = BrowserPage::new(
            self.client.clone(),
            self.stealth_profile,
            self.session_profile.clone(),
            self.behavioral_engine.clone(),
        );
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
