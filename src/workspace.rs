//! The scratch directory a run unpacks and rebuilds the package in.
//!
//! It is wiped when a run starts and left populated afterwards, so the
//! patched rule and the deployed `package.zip` can be inspected.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::rule::{RuleName, DUPLICATE_RULE_FOLDER};

const RETRIEVED_ARCHIVE: &str = "unpackaged.zip";
const PACKAGE_ARCHIVE: &str = "package.zip";

#[derive(Debug, Clone)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove the directory and everything in it. Missing is fine.
    pub async fn reset(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(path = %self.root.display(), "removed scratch workspace");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Transient copy of the retrieved archive.
    pub fn retrieved_archive_path(&self) -> PathBuf {
        self.root.join(RETRIEVED_ARCHIVE)
    }

    /// The rebuilt archive that gets deployed.
    pub fn package_path(&self) -> PathBuf {
        self.root.join(PACKAGE_ARCHIVE)
    }

    /// `<root>/duplicateRules/<name>.duplicateRule`
    pub fn rule_path(&self, name: &RuleName) -> PathBuf {
        self.root.join(DUPLICATE_RULE_FOLDER).join(name.file_name())
    }
}
