use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use azure_core::{error::ErrorKind, request_options::IfMatchCondition, RetryOptions, StatusCode};
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::{BlobServiceClient, ClientBuilder, ContainerClient};
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;
use tracing::{instrument, Level};

use crate::{BlobContainer, BlobService, BlobServiceProvider, CreateOutcome};

/// Connects to Azure Blob Storage with a token credential.
#[derive(Clone, Copy, Debug, Default)]
pub struct AzureBlobServiceProvider;

impl BlobServiceProvider for AzureBlobServiceProvider {
    fn connect(
        &self,
        endpoint: &ServiceEndpoint,
        credential: Credential,
    ) -> anyhow::Result<Arc<dyn BlobService>> {
        let location = CloudLocation::Custom {
            account: endpoint.account().to_owned(),
            uri: endpoint.base().to_owned(),
        };
        let client = ClientBuilder::with_location(location, StorageCredentials::token_credential(credential))
            .retry(RetryOptions::none())
            .blob_service_client();
        Ok(Arc::new(AzureBlobService { client }))
    }
}

struct AzureBlobService {
    client: BlobServiceClient,
}

impl BlobService for AzureBlobService {
    fn container(&self, name: &str) -> Arc<dyn BlobContainer> {
        Arc::new(AzureContainer {
            name: name.to_owned(),
            client: self.client.container_client(name),
        })
    }
}

struct AzureContainer {
    name: String,
    client: ContainerClient,
}

#[async_trait]
impl BlobContainer for AzureContainer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "sampleweb_blob.container_exists", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn exists(&self) -> anyhow::Result<bool> {
        self.client
            .exists()
            .await
            .with_context(|| format!("failed to check whether container '{}' exists", self.name))
    }

    #[instrument(name = "sampleweb_blob.create_container", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn create(&self) -> anyhow::Result<CreateOutcome> {
        match self.client.create().await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_conflict(&err) => Ok(CreateOutcome::AlreadyExists),
            Err(err) => {
                Err(err).with_context(|| format!("failed to create container '{}'", self.name))
            }
        }
    }

    #[instrument(name = "sampleweb_blob.blob_exists", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn has_blob(&self, name: &str) -> anyhow::Result<bool> {
        self.client
            .blob_client(name)
            .exists()
            .await
            .with_context(|| format!("failed to check whether blob '{name}' exists"))
    }

    #[instrument(name = "sampleweb_blob.create_blob", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn create_blob(&self, name: &str) -> anyhow::Result<CreateOutcome> {
        let res = self
            .client
            .blob_client(name)
            .put_block_blob(Vec::<u8>::new())
            .if_match(IfMatchCondition::NotMatch("*".to_owned()))
            .await;
        match res {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_conflict(&err) => Ok(CreateOutcome::AlreadyExists),
            Err(err) => Err(err).with_context(|| format!("failed to create blob '{name}'")),
        }
    }

    #[instrument(name = "sampleweb_blob.put_blob", level = Level::DEBUG, skip(self, data), fields(container = %self.name, size = data.len()), err(level = Level::INFO))]
    async fn put_blob(&self, name: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.client
            .blob_client(name)
            .put_block_blob(data)
            .content_type("text/plain; charset=utf-8")
            .await
            .with_context(|| format!("failed to upload blob '{name}'"))?;
        Ok(())
    }

    #[instrument(name = "sampleweb_blob.get_blob", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn get_blob(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.client
            .blob_client(name)
            .get_content()
            .await
            .with_context(|| format!("failed to download blob '{name}'"))
    }
}

/// Whether the service rejected a create because the resource exists.
fn is_conflict(err: &azure_core::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::HttpResponse {
            status: StatusCode::Conflict,
            ..
        }
    )
}
