//! JSearch on RapidAPI, an aggregator over Google for Jobs listings.
pub mod client;
pub mod types;

pub use client::JSearch;
