//! Tracing setup shared by the `jobsift` binary and integration tests.
//!
//! [`init_logging`] installs one global subscriber writing to a daily rolling
//! file, optionally mirrored to stderr. Only the first call configures
//! anything; later calls return the path resolved the first time.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "JOBSIFT_LOG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used for the log file name and the default directory.
    pub app_name: &'static str,
    /// Takes precedence over `JOBSIFT_LOG_DIR` and `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "jobsift",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

impl LogConfig {
    /// CLI verbose mode: debug level mirrored to stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.default_filter = "debug";
            self.emit_stderr = true;
        }
        self
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn sink_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let file_name = format!("{}.log", config.app_name);
    let today = Local::now().format("%Y-%m-%d").to_string();
    let full_path = dir.join(format!("{file_name}.{today}"));

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_name));
    let _ = LOG_GUARD.set(guard);

    let mut layers = vec![sink_layer(config.format, writer, false)];
    if config.emit_stderr {
        layers.push(sink_layer(config.format, std::io::stderr, true));
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(full_path.clone());
    Ok(full_path)
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }
    match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => expand_home(Path::new(&dir)),
        _ => default_data_dir(app_name),
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.to_str().and_then(|s| s.strip_prefix("~/")), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/share").join(app_name),
        Err(_) => PathBuf::from(".").join(app_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_log_dir("jobsift", Some(Path::new("/tmp/jobsift-logs")));
        assert_eq!(dir, PathBuf::from("/tmp/jobsift-logs"));
    }

    #[test]
    fn verbose_raises_level_and_mirrors() {
        let config = LogConfig::default().verbose(true);
        assert_eq!(config.default_filter, "debug");
        assert!(config.emit_stderr);

        let quiet = LogConfig::default().verbose(false);
        assert_eq!(quiet.default_filter, "info");
        assert!(!quiet.emit_stderr);
    }
}
