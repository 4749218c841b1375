//! WebDriver session used to render client-side job boards.
//!
//! - [`browser::driver::BrowserDriver`]: WebDriver client wrapper with a stealth launch profile
//! - [`browser::page::BrowserPage`]: navigation, selector waits and DOM script evaluation
//! - [`browser::behavioral::BehavioralEngine`]: human-like timings
//! - [`browser::fingerprint`]: desktop fingerprint pool, also used for user-agent rotation
//! - [`browser::stealth`]: stealth profiles and JS evasions
pub mod browser;
