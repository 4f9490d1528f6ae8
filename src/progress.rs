//! User-visible progress messages.

use std::fmt;
use std::sync::Mutex;

use tracing::info;

/// A step of the deactivation workflow worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    RetrievalPending,
    Retrieved { label: String },
    AlreadyInactive,
    PreparingDeactivation,
    Deploying { id: String },
    DeploymentPending,
    Deactivated { label: String },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::RetrievalPending => f.write_str("Polling for Retrieval Status"),
            Progress::Retrieved { label } => {
                write!(f, "Retrieved Duplicate Rule with label : {}", label)
            }
            Progress::AlreadyInactive => f.write_str("Already Inactive, exiting"),
            Progress::PreparingDeactivation => f.write_str("Preparing Deactivation"),
            Progress::Deploying { id } => write!(f, "Deploying Deactivated Rule with ID {}", id),
            Progress::DeploymentPending => f.write_str("Polling for Deployment Status"),
            Progress::Deactivated { label } => write!(f, "Duplicate Rule {} deactivated", label),
        }
    }
}

/// Receives progress as the workflow runs.
pub trait ProgressSink {
    fn report(&self, progress: &Progress);
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn report(&self, progress: &Progress) {
        (**self).report(progress)
    }
}

/// Prints each message on its own line and mirrors it to `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    pub fn stdout() -> Self {
        Self { quiet: false }
    }

    /// Only log through `tracing`; used when stdout carries JSON.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, progress: &Progress) {
        if !self.quiet {
            println!("{}", progress);
        }
        info!(target: "duprule::progress", "{}", progress);
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, progress: &Progress) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(progress.to_string());
        }
    }
}
