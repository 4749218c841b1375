//! Markup and feed extraction strategies.
//!
//! [`MarkupExtractor`] fetches one search page and applies the source's CSS
//! selector rules, optionally through a [`BrowserRenderer`] for boards that
//! build their listings client-side. [`FeedExtractor`] reads RSS or Atom and
//! infers company and location from free text.

pub mod browser;
pub mod feed;
pub mod markup;
mod text;

pub use browser::{BrowserRenderer, FantocciniRenderer, RenderedCard};
pub use feed::{infer_company, infer_location, FeedEntry, FeedExtractor};
pub use markup::{build_search_url, requires_browser, MarkupExtractor};
pub use text::html_to_text;
