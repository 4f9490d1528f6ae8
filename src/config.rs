//! Workflow settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default scratch directory, relative to the invocation directory.
pub const DEFAULT_SCRATCH_DIR: &str = "temp_sfpowerkit";

/// Settings for a [`Deactivator`](crate::Deactivator) run.
#[derive(Debug, Clone)]
pub struct DeactivateConfig {
    /// Where the retrieved package is unpacked and rebuilt.
    pub scratch_dir: PathBuf,
    /// Fixed wait between status checks.
    pub poll_interval: Duration,
    /// Upper bound on waiting for the retrieve job.
    pub retrieve_timeout: Duration,
    /// Upper bound on waiting for the deploy job.
    pub deploy_timeout: Duration,
}

impl Default for DeactivateConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            poll_interval: Duration::from_secs(5),
            retrieve_timeout: Duration::from_secs(60),
            deploy_timeout: Duration::from_secs(300),
        }
    }
}

impl DeactivateConfig {
    pub fn with_scratch_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.scratch_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retrieve_timeout(mut self, timeout: Duration) -> Self {
        self.retrieve_timeout = timeout;
        self
    }

    pub fn with_deploy_timeout(mut self, timeout: Duration) -> Self {
        self.deploy_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeactivateConfig::default();
        assert_eq!(config.scratch_dir, PathBuf::from("temp_sfpowerkit"));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.retrieve_timeout, Duration::from_secs(60));
        assert_eq!(config.deploy_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let config = DeactivateConfig::default()
            .with_scratch_dir("/tmp/scratch")
            .with_poll_interval(Duration::from_millis(10))
            .with_retrieve_timeout(Duration::from_secs(1))
            .with_deploy_timeout(Duration::from_secs(2));

        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/scratch"));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.retrieve_timeout, Duration::from_secs(1));
        assert_eq!(config.deploy_timeout, Duration::from_secs(2));
    }
}
