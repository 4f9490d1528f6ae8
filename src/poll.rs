//! Fixed-interval polling of Metadata API async jobs.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use duprule_sf_metadata::AsyncJob;
use tokio::time::{sleep, Instant};
use tracing::{debug, error};

use crate::error::{Error, ErrorKind, Result};

/// Where a polled job stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Submitted, not yet checked.
    Submitted,
    /// Checked at least once and still running.
    Pending,
    /// The job reported `done`; its payload may still carry a failure.
    Done,
}

impl PollState {
    /// Transition after a status check.
    pub fn advance(self, done: bool) -> Self {
        match (self, done) {
            (PollState::Done, _) | (_, true) => PollState::Done,
            _ => PollState::Pending,
        }
    }
}

/// Polls a job until it reports done, waiting `interval` between checks.
///
/// A failing status check ends the loop immediately; there is no retry.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
    timeout: Duration,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Run `check` until the returned job is done.
    ///
    /// `on_pending` fires once for every check that finds the job still
    /// running, before the wait.
    pub async fn until_done<T, E, F, Fut, P>(
        &self,
        operation: &str,
        mut check: F,
        mut on_pending: P,
    ) -> Result<T>
    where
        T: AsyncJob,
        E: Into<Error> + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: FnMut(),
    {
        let started = Instant::now();
        let mut state = PollState::Submitted;
        let mut checks = 0u32;

        loop {
            let job = match check().await {
                Ok(job) => job,
                Err(err) => {
                    error!(operation, error = %err, "status check failed");
                    return Err(err.into());
                }
            };
            checks += 1;
            state = state.advance(job.is_done());
            debug!(operation, id = job.id(), ?state, checks, "polled job");

            if state == PollState::Done {
                return Ok(job);
            }

            if started.elapsed() >= self.timeout {
                error!(operation, id = job.id(), checks, "polling timed out");
                return Err(Error::new(ErrorKind::Timeout {
                    operation: operation.to_string(),
                    seconds: self.timeout.as_secs(),
                }));
            }

            on_pending();
            sleep(self.interval).await;
        }
    }
}
