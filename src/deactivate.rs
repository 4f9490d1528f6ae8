//! The retrieve, patch and redeploy workflow.

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use duprule_sf_metadata::{DeployOptions, DeployResult, PackageManifest, RetrieveRequest};

use crate::archive::{build_package, extract_archive};
use crate::config::DeactivateConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::poll::Poller;
use crate::progress::{Progress, ProgressSink};
use crate::rule::{RuleDocument, RuleName, DUPLICATE_RULE_TYPE};
use crate::service::MetadataService;
use crate::workspace::ScratchWorkspace;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivateOutcome {
    /// `masterLabel`, or the rule name when the label is missing.
    pub label: String,
    /// The rule was already inactive and nothing was deployed.
    pub already_inactive: bool,
    /// Id of the deploy job, when one ran.
    pub deploy_id: Option<String>,
}

impl DeactivateOutcome {
    /// The payload reported to callers, `{"status":1}`.
    pub fn status(&self) -> StatusPayload {
        StatusPayload { status: 1 }
    }
}

/// JSON result of the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub status: u8,
}

/// Deactivates Duplicate Rules through a [`MetadataService`].
#[derive(Debug)]
pub struct Deactivator<S, P> {
    service: S,
    progress: P,
    config: DeactivateConfig,
}

impl<S: MetadataService, P: ProgressSink> Deactivator<S, P> {
    pub fn new(service: S, progress: P, config: DeactivateConfig) -> Self {
        Self {
            service,
            progress,
            config,
        }
    }

    pub fn config(&self) -> &DeactivateConfig {
        &self.config
    }

    /// Retrieve the rule, set `isActive` to `false` and deploy it back.
    ///
    /// Already inactive rules are left alone. The scratch workspace is wiped
    /// first and stays populated afterwards.
    #[instrument(skip_all, fields(rule = %name))]
    pub async fn deactivate(&self, name: &RuleName) -> Result<DeactivateOutcome> {
        let workspace = ScratchWorkspace::new(&self.config.scratch_dir);
        workspace.reset().await?;

        let api_version = submit(
            "retrieveMaxApiVersion",
            self.service.retrieve_max_api_version().await,
        )?;
        let payload = self.retrieve(name, &api_version).await?;

        workspace.create().await?;
        let target = workspace.clone();
        blocking(move || extract_archive(&payload, &target)).await?;

        let rule_path = workspace.rule_path(name);
        if !tokio::fs::try_exists(&rule_path).await? {
            warn!(path = %rule_path.display(), "retrieved package has no rule file");
            return Err(Error::not_found("Duplicate Rule not found in the org"));
        }

        let mut rule = RuleDocument::parse(&tokio::fs::read_to_string(&rule_path).await?)?;
        let label = rule
            .master_label()
            .unwrap_or_else(|| name.as_str().to_string());
        self.report(Progress::Retrieved {
            label: label.clone(),
        });

        if rule.is_inactive() {
            self.report(Progress::AlreadyInactive);
            return Ok(DeactivateOutcome {
                label,
                already_inactive: true,
                deploy_id: None,
            });
        }

        self.report(Progress::PreparingDeactivation);
        rule.deactivate();
        tokio::fs::write(&rule_path, rule.to_xml()?).await?;

        let target = workspace.clone();
        let package = blocking(move || build_package(&target)).await?;
        let deploy_id = self.deploy(&package).await?;

        self.report(Progress::Deactivated {
            label: label.clone(),
        });
        Ok(DeactivateOutcome {
            label,
            already_inactive: false,
            deploy_id: Some(deploy_id),
        })
    }

    /// Submit the retrieve and poll it; returns the base64 archive.
    async fn retrieve(&self, name: &RuleName, api_version: &str) -> Result<String> {
        let manifest = PackageManifest::new(api_version)
            .add_type(DUPLICATE_RULE_TYPE, vec![name.as_str().to_string()]);
        let request = RetrieveRequest::single_package(manifest).with_api_version(api_version);

        let id = submit("retrieve", self.service.retrieve(&request).await)?;
        info!(id = %id, api_version, "retrieve submitted");

        let service = &self.service;
        let job_id = id.as_str();
        let result = Poller::new(self.config.poll_interval, self.config.retrieve_timeout)
            .until_done(
                "retrieval",
                move || service.check_retrieve_status(job_id),
                || self.report(Progress::RetrievalPending),
            )
            .await?;

        for message in &result.messages {
            warn!(file = %message.file_name, problem = %message.problem, "retrieve message");
        }

        result
            .archive()
            .map(str::to_string)
            .ok_or_else(|| Error::not_found("Unable to find the requested Duplicate Rule"))
    }

    /// Submit the package and poll the deploy; returns the deploy id.
    async fn deploy(&self, package: &[u8]) -> Result<String> {
        let options = DeployOptions {
            rollback_on_error: true,
            single_package: true,
            ..Default::default()
        };

        let id = submit("deploy", self.service.deploy(package, &options).await)?;
        info!(id = %id, "deploy submitted");
        self.report(Progress::Deploying { id: id.clone() });

        let service = &self.service;
        let job_id = id.as_str();
        let result = Poller::new(self.config.poll_interval, self.config.deploy_timeout)
            .until_done(
                "deployment",
                move || service.check_deploy_status(job_id),
                || self.report(Progress::DeploymentPending),
            )
            .await?;

        if !result.success {
            return Err(deployment_failure(&result));
        }
        Ok(id)
    }

    fn report(&self, progress: Progress) {
        self.progress.report(&progress);
    }
}

/// Run zip and walkdir work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Convert a submit-call result, logging failures.
fn submit<T>(
    operation: &str,
    result: std::result::Result<T, duprule_sf_metadata::Error>,
) -> Result<T> {
    result.map_err(|err| {
        error!(operation, error = %err, "metadata call failed");
        Error::from(err)
    })
}

fn deployment_failure(result: &DeployResult) -> Error {
    let problems: Vec<String> = result
        .component_failures
        .iter()
        .map(ToString::to_string)
        .collect();

    let message = match (&result.error_message, problems.is_empty()) {
        (Some(message), _) => message.clone(),
        (None, false) => problems.join("; "),
        (None, true) => format!("deploy {} finished with status {:?}", result.id, result.status),
    };

    error!(id = %result.id, status = ?result.status, %message, "deployment failed");
    Error::new(ErrorKind::DeploymentFailure { message, problems })
}
