//! Reed (reed.co.uk) job search API.
//!
//! Basic auth with the API key as the username and an empty password.
pub mod client;
pub mod types;

pub use client::Reed;
