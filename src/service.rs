//! The Metadata API operations the workflow depends on.

use duprule_sf_metadata::{
    DeployOptions, DeployResult, MetadataClient, RetrieveRequest, RetrieveResult,
};

type ServiceResult<T> = std::result::Result<T, duprule_sf_metadata::Error>;

/// Submit and status-check calls against an org.
///
/// [`MetadataClient`] is the real implementation; tests script their own.
#[allow(async_fn_in_trait)]
pub trait MetadataService {
    /// Highest API version the org supports, e.g. `"62.0"`.
    async fn retrieve_max_api_version(&self) -> ServiceResult<String>;

    /// Start a retrieve; returns the async process id.
    async fn retrieve(&self, request: &RetrieveRequest) -> ServiceResult<String>;

    /// Status of a retrieve, including the zip payload once done.
    async fn check_retrieve_status(&self, id: &str) -> ServiceResult<RetrieveResult>;

    /// Start a deploy of a zipped package; returns the async process id.
    async fn deploy(&self, package_zip: &[u8], options: &DeployOptions) -> ServiceResult<String>;

    /// Status of a deploy, including component failures.
    async fn check_deploy_status(&self, id: &str) -> ServiceResult<DeployResult>;
}

impl MetadataService for MetadataClient {
    async fn retrieve_max_api_version(&self) -> ServiceResult<String> {
        MetadataClient::retrieve_max_api_version(self).await
    }

    async fn retrieve(&self, request: &RetrieveRequest) -> ServiceResult<String> {
        MetadataClient::retrieve(self, request).await
    }

    async fn check_retrieve_status(&self, id: &str) -> ServiceResult<RetrieveResult> {
        MetadataClient::check_retrieve_status(self, id, true).await
    }

    async fn deploy(&self, package_zip: &[u8], options: &DeployOptions) -> ServiceResult<String> {
        MetadataClient::deploy(self, package_zip, options).await
    }

    async fn check_deploy_status(&self, id: &str) -> ServiceResult<DeployResult> {
        MetadataClient::check_deploy_status(self, id, true).await
    }
}

impl<S: MetadataService> MetadataService for &S {
    async fn retrieve_max_api_version(&self) -> ServiceResult<String> {
        (**self).retrieve_max_api_version().await
    }

    async fn retrieve(&self, request: &RetrieveRequest) -> ServiceResult<String> {
        (**self).retrieve(request).await
    }

    async fn check_retrieve_status(&self, id: &str) -> ServiceResult<RetrieveResult> {
        (**self).check_retrieve_status(id).await
    }

    async fn deploy(&self, package_zip: &[u8], options: &DeployOptions) -> ServiceResult<String> {
        (**self).deploy(package_zip, options).await
    }

    async fn check_deploy_status(&self, id: &str) -> ServiceResult<DeployResult> {
        (**self).check_deploy_status(id).await
    }
}
