use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

/// Snapshot of user agent, viewport and locale characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub languages: Vec<String>,
    pub timezone: String,
}

const DESKTOP_PROFILES: &[(&str, (u32, u32), &str, &str)] = &[
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        (1920, 1080),
        "Win32",
        "America/New_York",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        (1440, 900),
        "MacIntel",
        "America/Los_Angeles",
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
        (1536, 864),
        "Win32",
        "Europe/London",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
        (1680, 1050),
        "MacIntel",
        "America/Chicago",
    ),
    (
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        (1920, 1080),
        "Linux x86_64",
        "Europe/Berlin",
    ),
];

/// User-agent strings of the built-in desktop pool.
pub fn desktop_user_agents() -> Vec<String> {
    DESKTOP_PROFILES
        .iter()
        .map(|(ua, ..)| (*ua).to_string())
        .collect()
}

/// A small pool of plausible desktop fingerprints.
#[derive(Debug, Clone)]
pub struct UserAgentManager {
    desktop_profiles: Vec<UserAgentProfile>,
}

impl Default for UserAgentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentManager {
    pub fn new() -> Self {
        Self {
            desktop_profiles: DESKTOP_PROFILES
                .iter()
                .map(|(ua, viewport, platform, timezone)| UserAgentProfile {
                    user_agent: (*ua).to_string(),
                    viewport: *viewport,
                    platform: (*platform).to_string(),
                    languages: vec!["en-US".to_string(), "en".to_string()],
                    timezone: (*timezone).to_string(),
                })
                .collect(),
        }
    }

    /// Pick one profile for a browser session.
    pub fn session_profile(&self) -> UserAgentProfile {
        let mut rng = rand::thread_rng();
        self.desktop_profiles
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| UserAgentProfile {
                user_agent: DESKTOP_PROFILES[0].0.to_string(),
                viewport: DESKTOP_PROFILES[0].1,
                platform: DESKTOP_PROFILES[0].2.to_string(),
                languages: vec!["en-US".to_string()],
                timezone: DESKTOP_PROFILES[0].3.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_profile_comes_from_pool() {
        let manager = UserAgentManager::new();
        let agents = desktop_user_agents();
        for _ in 0..20 {
            assert!(agents.contains(&manager.session_profile().user_agent));
        }
    }
}
