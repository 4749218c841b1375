use std::time::Duration;

use crate::browser::{
    behavioral::BehavioralEngine,
    fingerprint::UserAgentProfile,
    stealth::{StealthProfile, StealthScripts},
};
use anyhow::{Context, Result};
use fantoccini::{Client, Locator};
use serde_json::Value;

/// One navigated tab of a [`super::driver::BrowserDriver`] session.
pub struct BrowserPage {
    client: Client,
    stealth_profile: StealthProfile,
    session_profile: UserAgentProfile,
    behavioral_engine: BehavioralEngine,
}

impl BrowserPage {
    pub(crate) fn new(
        client: Client,
        stealth_profile: StealthProfile,
        session_profile: UserAgentProfile,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth_profile,
            session_profile,
            behavioral_engine,
        }
    }

    /// Navigate to `url` and apply the stealth scripts for this session.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.behavioral_engine.random_delay(300, 1200).await;
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;

        for script in StealthScripts::for_profile(self.stealth_profile, &self.session_profile) {
            self.client.execute(&script, vec![]).await?;
        }
        Ok(())
    }

    /// Wait until `selector` matches, giving up after `timeout`.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .with_context(|| format!("selector `{selector}` never appeared"))?;
        Ok(())
    }

    /// Let client-side rendering settle.
    pub async fn settle(&self, settle: Duration) {
        tokio::time::sleep(settle).await;
    }

    /// Run `script` in the page with JSON `args` (available as `arguments`).
    pub async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .execute(script, args)
            .await
            .context("script evaluation failed")
    }
}
