//! The blob storage round trip.

mod azure;
pub mod memory;
mod round_trip;

use std::sync::Arc;

use async_trait::async_trait;
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;

pub use azure::AzureBlobServiceProvider;
pub use round_trip::{ensure_blob, ensure_container, StorageRoundTrip};

/// Builds blob service clients.
pub trait BlobServiceProvider: Send + Sync {
    fn connect(
        &self,
        endpoint: &ServiceEndpoint,
        credential: Credential,
    ) -> anyhow::Result<Arc<dyn BlobService>>;
}

/// A blob storage account.
pub trait BlobService: Send + Sync {
    /// Returns a handle to a container. No request is made.
    fn container(&self, name: &str) -> Arc<dyn BlobContainer>;
}

/// Whether a create call made something new.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Someone else created it first.
    AlreadyExists,
}

/// A container of blobs.
#[async_trait]
pub trait BlobContainer: Send + Sync {
    fn name(&self) -> &str;

    async fn exists(&self) -> anyhow::Result<bool>;

    async fn create(&self) -> anyhow::Result<CreateOutcome>;

    async fn has_blob(&self, name: &str) -> anyhow::Result<bool>;

    /// Creates an empty blob unless one with this name exists.
    async fn create_blob(&self, name: &str) -> anyhow::Result<CreateOutcome>;

    /// Uploads `data`, replacing any existing content.
    async fn put_blob(&self, name: &str, data: Vec<u8>) -> anyhow::Result<()>;

    async fn get_blob(&self, name: &str) -> anyhow::Result<Vec<u8>>;
}
