use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use jobsift_common::{JobPosting, JobsiftError, Result};
use tracing::info;

use crate::stats::JobStats;

const DESCRIPTION_LIMIT: usize = 500;

const CSV_HEADER: [&str; 15] = [
    "ID",
    "Title",
    "Company",
    "Location",
    "Salary",
    "Description",
    "Link",
    "Source",
    "Keywords",
    "Experience Level",
    "Is Remote",
    "Relevance Score",
    "Scraped At",
    "Updated At",
    "Is Active",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = JobsiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(JobsiftError::Export(format!("unknown export format `{other}`"))),
        }
    }
}

/// Writes posting snapshots into a directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Export `postings` and return the written path.
    ///
    /// `file_name` defaults to a timestamped name; the format's extension is
    /// appended when missing. CSV exports with `stats` also write a
    /// `<name>_stats.csv` companion.
    pub fn export(
        &self,
        format: ExportFormat,
        postings: &[JobPosting],
        stats: Option<&JobStats>,
        file_name: Option<&str>,
    ) -> Result<PathBuf> {
        if postings.is_empty() {
            return Err(JobsiftError::NoPostings);
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(output_name(format, file_name));

        match format {
            ExportFormat::Csv => {
                write_postings_csv(&path, postings)?;
                if let Some(stats) = stats {
                    write_stats_csv(&stats_path(&path), stats)?;
                }
            }
            ExportFormat::Json => {
                let file = File::create(&path)?;
                serde_json::to_writer_pretty(file, postings)
                    .map_err(|err| JobsiftError::Export(err.to_string()))?;
            }
        }

        info!(path = %path.display(), format = %format, postings = postings.len(), "export.written");
        Ok(path)
    }
}

fn output_name(format: ExportFormat, file_name: Option<&str>) -> String {
    let ext = format.extension();
    match file_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if Path::new(name).extension().is_some_and(|e| e == ext) => name.to_string(),
        Some(name) => format!("{name}.{ext}"),
        None => format!(
            "jobs_export_{}.{ext}",
            Utc::now().format("%Y-%m-%d_%H-%M-%S")
        ),
    }
}

fn stats_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jobs_export".to_string());
    path.with_file_name(format!("{stem}_stats.csv"))
}

fn csv_error(err: csv::Error) -> JobsiftError {
    JobsiftError::Export(err.to_string())
}

/// Whitespace collapsed and clipped to the export limit.
fn flatten_description(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= DESCRIPTION_LIMIT {
        return flat;
    }
    let clipped: String = flat.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{clipped}...")
}

fn write_postings_csv(path: &Path, postings: &[JobPosting]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for p in postings {
        writer
            .write_record([
                p.id.clone(),
                p.title.clone(),
                p.company.clone(),
                p.location.clone(),
                p.salary.clone(),
                flatten_description(&p.description),
                p.link.clone(),
                p.source.clone(),
                p.keywords.join("; "),
                p.experience_level.to_string(),
                p.remote.to_string(),
                format!("{:.2}", p.relevance),
                p.scraped_at.to_rfc3339(),
                p.updated_at.to_rfc3339(),
                p.is_active.to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_stats_csv(path: &Path, stats: &JobStats) -> Result<()> {
    // Sections have different widths.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let last_scraped = stats
        .last_scraped
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    let mut rows: Vec<Vec<String>> = vec![
        vec!["Summary".into()],
        vec!["Total Jobs".into(), stats.total_jobs.to_string()],
        vec!["Recent Jobs (24h)".into(), stats.recent_jobs.to_string()],
        vec!["Last Scraped".into(), last_scraped],
        vec![],
        vec!["Jobs by Source".into()],
    ];
    rows.extend(
        stats
            .jobs_by_source
            .iter()
            .map(|(source, n)| vec![source.clone(), n.to_string()]),
    );
    rows.push(vec![]);
    rows.push(vec!["Top Locations".into()]);
    rows.extend(
        stats
            .top_locations(10)
            .into_iter()
            .map(|(location, n)| vec![location, n.to_string()]),
    );
    rows.push(vec![]);
    rows.push(vec!["Top Keywords".into()]);
    rows.extend(
        stats
            .top_keywords(20)
            .into_iter()
            .map(|(keyword, n)| vec![keyword, n.to_string()]),
    );

    for row in rows {
        if row.is_empty() {
            writer.write_record([""]).map_err(csv_error)?;
        } else {
            writer.write_record(&row).map_err(csv_error)?;
        }
    }
    writer.flush()?;
    Ok(())
}
