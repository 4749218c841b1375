use serde::{Deserialize, Serialize};

use super::fingerprint::UserAgentProfile;

/// Levels of stealth applied to the browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthProfile {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// Browser command-line arguments for a profile and fingerprint.
pub fn build_stealth_arguments(profile: StealthProfile, user_profile: &UserAgentProfile) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        format!("--user-agent={}", user_profile.user_agent),
        format!(
            "--window-size={},{}",
            user_profile.viewport.0, user_profile.viewport.1
        ),
        format!("--lang={}", user_profile.languages.join(",")),
    ];
    if profile == StealthProfile::Maximum {
        args.push("--disable-gpu".to_string());
        args.push("--disable-plugins-discovery".to_string());
    }
    args
}

/// JavaScript evasions applied after each navigation.
pub struct StealthScripts;

impl StealthScripts {
    pub fn core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1,2,3] });
            Object.defineProperty(navigator, 'languages', {
                get: () => ['en-US', 'en']
            });
            if (!window.chrome) window.chrome = { runtime: {} };
        "#
    }

    pub fn webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    /// Overrides `navigator.platform` with the session fingerprint's value.
    pub fn platform_override(platform: &str) -> String {
        format!(
            "Object.defineProperty(navigator, 'platform', {{ get: () => {} }});",
            serde_json::Value::String(platform.to_string())
        )
    }

    /// Scripts for `profile`, in application order.
    pub fn for_profile(profile: StealthProfile, user_profile: &UserAgentProfile) -> Vec<String> {
        let mut scripts = vec![Self::core_evasions().to_string()];
        match profile {
            StealthProfile::Lightweight => {}
            StealthProfile::Balanced => {
                scripts.push(Self::platform_override(&user_profile.platform));
            }
            StealthProfile::Maximum => {
                scripts.push(Self::platform_override(&user_profile.platform));
                scripts.push(Self::webgl_evasions().to_string());
            }
        }
        scripts
    }
}
