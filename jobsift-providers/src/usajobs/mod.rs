//! USAJobs (data.usajobs.gov) search API for US federal positions.
pub mod client;
pub mod types;

pub use client::UsaJobs;
