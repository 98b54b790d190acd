use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

use survey_server::config::{AppConfig, AuthConfig, DatabaseConfig, UploadsConfig};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-key-for-testing-purposes-only";

/// Get a unique test identifier for isolation
pub fn get_unique_test_id() -> String {
    let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    format!("test-{}-{}", pid, counter)
}

/// Test-specific configuration pointing every path into a temporary directory
#[derive(Debug)]
pub struct TestConfig {
    pub temp_dir: TempDir,
    pub config: AppConfig,
    pub test_id: String,
}

#[allow(dead_code)]
impl TestConfig {
    pub fn new() -> Self {
        let test_id = get_unique_test_id();
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory for test");

        let config = AppConfig {
            database: DatabaseConfig {
                path: temp_dir.path().join(format!("survey-{}.db", test_id)),
            },
            auth: AuthConfig {
                jwt_secret: Some(TEST_JWT_SECRET.to_string()),
                ..AuthConfig::default()
            },
            uploads: UploadsConfig {
                dir: temp_dir.path().join("uploads"),
                ..UploadsConfig::default()
            },
            ..AppConfig::default()
        };

        Self {
            temp_dir,
            config,
            test_id,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.config.uploads.dir
    }

    /// Number of files currently in the upload directory
    pub fn stored_upload_count(&self) -> usize {
        std::fs::read_dir(self.uploads_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
