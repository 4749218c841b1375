//! Durable posting storage.
//!
//! [`FileStore`] keeps every posting in memory and persists the whole set as a
//! pretty-printed JSON array at `<data_dir>/jobs.json`. Writes go to a sibling
//! temporary file first and are renamed into place, so a crash mid-write leaves
//! the previous snapshot intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use jobsift_common::{JobPosting, JobsiftError, Result};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::filter::JobFilter;
use crate::stats::JobStats;

const JOBS_FILE: &str = "jobs.json";

/// Outcome of a [`Storage::store`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub inserted: usize,
    pub updated: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Upsert by posting id.
    async fn store(&self, postings: &[JobPosting]) -> Result<StoreReport>;

    /// Matching page plus the total match count.
    async fn search(&self, filter: &JobFilter) -> Result<(Vec<JobPosting>, usize)>;

    async fn all(&self) -> Result<Vec<JobPosting>>;

    async fn stats(&self) -> Result<JobStats>;

    async fn close(&self) -> Result<()>;
}

#[derive(Default)]
struct State {
    postings: Vec<JobPosting>,
    index: HashMap<String, usize>,
}

impl State {
    fn from_postings(postings: Vec<JobPosting>) -> Self {
        let index = postings
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.id.clone(), slot))
            .collect();
        State { postings, index }
    }

    /// Returns true when the posting was new.
    fn upsert(&mut self, mut posting: JobPosting) -> bool {
        match self.index.get(&posting.id) {
            Some(&slot) => {
                let existing = &mut self.postings[slot];
                posting.scraped_at = existing.scraped_at;
                posting.updated_at = Utc::now();
                *existing = posting;
                false
            }
            None => {
                self.index.insert(posting.id.clone(), self.postings.len());
                self.postings.push(posting);
                true
            }
        }
    }
}

pub struct FileStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl FileStore {
    /// Open (or create) the store under `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(JOBS_FILE);

        let postings = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<JobPosting>>(&bytes).map_err(|err| {
                JobsiftError::Storage(format!("{} is corrupt: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), postings = postings.len(), "store.opened");

        Ok(Self {
            path,
            state: RwLock::new(State::from_postings(postings)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, postings: &[JobPosting]) -> Result<()> {
        let body = serde_json::to_vec_pretty(postings)
            .map_err(|err| JobsiftError::Storage(format!("serialize postings: {err}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), postings = postings.len(), "store.persisted");
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStore {
    async fn store(&self, postings: &[JobPosting]) -> Result<StoreReport> {
        let mut state = self.state.write().await;
        let mut report = StoreReport::default();
        for posting in postings {
            if state.upsert(posting.clone()) {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }
        self.persist(&state.postings).await?;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            "store.saved"
        );
        Ok(report)
    }

    async fn search(&self, filter: &JobFilter) -> Result<(Vec<JobPosting>, usize)> {
        let state = self.state.read().await;
        Ok(filter.apply(&state.postings))
    }

    async fn all(&self) -> Result<Vec<JobPosting>> {
        Ok(self.state.read().await.postings.clone())
    }

    async fn stats(&self) -> Result<JobStats> {
        let state = self.state.read().await;
        Ok(JobStats::from_postings(&state.postings, Utc::now()))
    }

    async fn close(&self) -> Result<()> {
        let state = self.state.read().await;
        self.persist(&state.postings).await
    }
}
