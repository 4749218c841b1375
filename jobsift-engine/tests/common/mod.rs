use std::sync::OnceLock;

use jobsift_common::observability::{init_logging, LogConfig};

static TRACING: OnceLock<()> = OnceLock::new();

/// Route test logs through the production subscriber once per test binary.
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let config = LogConfig {
            app_name: "jobsift-test",
            log_dir: Some(std::env::temp_dir().join("jobsift-test-logs")),
            default_filter: "debug",
            ..LogConfig::default()
        };
        let _ = init_logging(config);
    });
}
