use std::sync::Arc;

use chrono::{DateTime, Local};
use sampleweb_common::{log_line, ErrorKind, RoundTripResult, WithKind};
use sampleweb_config::{SiteConfig, DEFAULT_BLOB_CONTAINER, DEFAULT_BLOB_NAME};
use sampleweb_identity::{CredentialProvider, CredentialSource};

use crate::{BlobContainer, BlobService, BlobServiceProvider, CreateOutcome};

/// Writes a log line to a blob and reads it back.
pub struct StorageRoundTrip {
    provider: Arc<dyn BlobServiceProvider>,
    credentials: Arc<dyn CredentialProvider>,
    container_name: String,
    blob_name: String,
}

impl StorageRoundTrip {
    pub fn new(
        provider: Arc<dyn BlobServiceProvider>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            provider,
            credentials,
            container_name: DEFAULT_BLOB_CONTAINER.to_owned(),
            blob_name: DEFAULT_BLOB_NAME.to_owned(),
        }
    }

    /// Runs the round trip, timestamping the log line with the current local time.
    pub async fn run(&self, config: &SiteConfig) -> RoundTripResult {
        self.run_at(config, Local::now()).await
    }

    pub async fn run_at(&self, config: &SiteConfig, now: DateTime<Local>) -> RoundTripResult {
        let endpoint = config.storage_endpoint().kind(ErrorKind::Configuration)?;
        let source = CredentialSource::from_client_id(config.user_assigned_client_id());
        let credential = self
            .credentials
            .credential(&source)
            .kind(ErrorKind::Credential)?;
        let service = self
            .provider
            .connect(&endpoint, credential)
            .kind(ErrorKind::Configuration)?;

        let container = ensure_container(service.as_ref(), &self.container_name)
            .await
            .kind(ErrorKind::Provision)?;
        ensure_blob(container.as_ref(), &self.blob_name)
            .await
            .kind(ErrorKind::Provision)?;

        let line = log_line::blob_log_line(&now, config.site_label().as_str(), &source.describe());
        container
            .put_blob(&self.blob_name, line.into_bytes())
            .await
            .kind(ErrorKind::Write)?;

        let content = container
            .get_blob(&self.blob_name)
            .await
            .kind(ErrorKind::Read)?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }
}

/// Returns the named container, creating it if it does not exist.
pub async fn ensure_container(
    service: &dyn BlobService,
    name: &str,
) -> anyhow::Result<Arc<dyn BlobContainer>> {
    let container = service.container(name);
    if !container.exists().await? && container.create().await? == CreateOutcome::AlreadyExists {
        tracing::debug!("Container '{name}' was created concurrently");
    }
    Ok(container)
}

/// Creates an empty blob if none exists with this name.
pub async fn ensure_blob(container: &dyn BlobContainer, name: &str) -> anyhow::Result<()> {
    if !container.has_blob(name).await?
        && container.create_blob(name).await? == CreateOutcome::AlreadyExists
    {
        tracing::debug!(
            "Blob '{name}' in container '{}' was created concurrently",
            container.name()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sampleweb_identity::{Credential, ManagedIdentityCredential, ManagedIdentityEndpoint};

    use super::*;
    use crate::memory::MemoryBlobServiceProvider;

    struct StubCredentials;

    impl CredentialProvider for StubCredentials {
        fn credential(&self, _source: &CredentialSource) -> anyhow::Result<Credential> {
            Ok(Arc::new(ManagedIdentityCredential::new(
                "stub",
                ManagedIdentityEndpoint::Imds,
            )))
        }
    }

    struct NoCredentials;

    impl CredentialProvider for NoCredentials {
        fn credential(&self, _source: &CredentialSource) -> anyhow::Result<Credential> {
            anyhow::bail!("no managed identity available")
        }
    }

    /// A container whose every request fails, like an unreachable account.
    struct Unreachable;

    impl BlobServiceProvider for Unreachable {
        fn connect(
            &self,
            _endpoint: &sampleweb_config::ServiceEndpoint,
            _credential: Credential,
        ) -> anyhow::Result<Arc<dyn BlobService>> {
            Ok(Arc::new(Unreachable))
        }
    }

    impl BlobService for Unreachable {
        fn container(&self, _name: &str) -> Arc<dyn BlobContainer> {
            Arc::new(Unreachable)
        }
    }

    #[async_trait]
    impl BlobContainer for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
        async fn exists(&self) -> anyhow::Result<bool> {
            anyhow::bail!("error sending request: connection refused")
        }
        async fn create(&self) -> anyhow::Result<CreateOutcome> {
            anyhow::bail!("error sending request: connection refused")
        }
        async fn has_blob(&self, _name: &str) -> anyhow::Result<bool> {
            anyhow::bail!("error sending request: connection refused")
        }
        async fn create_blob(&self, _name: &str) -> anyhow::Result<CreateOutcome> {
            anyhow::bail!("error sending request: connection refused")
        }
        async fn put_blob(&self, _name: &str, _data: Vec<u8>) -> anyhow::Result<()> {
            anyhow::bail!("error sending request: connection refused")
        }
        async fn get_blob(&self, _name: &str) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("error sending request: connection refused")
        }
    }

    /// Reports nothing as existing, then loses every create to another writer.
    struct Racing;

    impl BlobService for Racing {
        fn container(&self, _name: &str) -> Arc<dyn BlobContainer> {
            Arc::new(Racing)
        }
    }

    #[async_trait]
    impl BlobContainer for Racing {
        fn name(&self) -> &str {
            "racing"
        }
        async fn exists(&self) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn create(&self) -> anyhow::Result<CreateOutcome> {
            Ok(CreateOutcome::AlreadyExists)
        }
        async fn has_blob(&self, _name: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn create_blob(&self, _name: &str) -> anyhow::Result<CreateOutcome> {
            Ok(CreateOutcome::AlreadyExists)
        }
        async fn put_blob(&self, _name: &str, _data: Vec<u8>) -> anyhow::Result<()> {
            Ok(())
        }
        async fn get_blob(&self, _name: &str) -> anyhow::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn config() -> SiteConfig {
        SiteConfig {
            hostname: Some("site-cds-1.example.net".into()),
            storage_config_path: Some(
                "https://acct.blob.core.windows.net/admin/config.json".into(),
            ),
            ..Default::default()
        }
    }

    fn at(second: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 16, 5, second).unwrap()
    }

    #[tokio::test]
    async fn writes_then_reads_back_the_log_line() {
        let memory = MemoryBlobServiceProvider::new();
        let round_trip = StorageRoundTrip::new(Arc::new(memory.clone()), Arc::new(StubCredentials));

        let text = round_trip.run_at(&config(), at(9)).await.unwrap();
        assert_eq!(
            text,
            "[3/7/2024 4:05:09 PM] This is a log message from Dedicated CDS and  from using default credential..\n"
        );
        let stored = memory.blob("testcontainer", "storagetest.txt").unwrap();
        assert_eq!(stored, text.as_bytes());
    }

    #[tokio::test]
    async fn consecutive_runs_overwrite() {
        let memory = MemoryBlobServiceProvider::new();
        let round_trip = StorageRoundTrip::new(Arc::new(memory.clone()), Arc::new(StubCredentials));

        let first = round_trip.run_at(&config(), at(1)).await.unwrap();
        let second = round_trip.run_at(&config(), at(2)).await.unwrap();
        assert_ne!(first, second);
        assert!(!second.contains(&first));
        assert_eq!(memory.blob("testcontainer", "storagetest.txt").unwrap(), second.as_bytes());
        assert_eq!(memory.blob_count("testcontainer"), Some(1));
    }

    #[tokio::test]
    async fn user_assigned_identity_is_described() {
        let round_trip = StorageRoundTrip::new(
            Arc::new(MemoryBlobServiceProvider::new()),
            Arc::new(StubCredentials),
        );
        let config = SiteConfig {
            user_assigned_client_id: Some("0000-1111".into()),
            ..config()
        };
        let text = round_trip.run_at(&config, at(3)).await.unwrap();
        assert!(text.ends_with("and  from using user assigned identity 0000-1111..\n"));
    }

    #[tokio::test]
    async fn unreachable_account_is_a_provision_failure() {
        let round_trip = StorageRoundTrip::new(Arc::new(Unreachable), Arc::new(StubCredentials));
        let err = round_trip.run_at(&config(), at(4)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provision);
        let body = err.user_message();
        assert!(body.starts_with("Sorry, something went wrong."));
        assert!(body.ends_with("connection refused"));
    }

    #[tokio::test]
    async fn credential_failures_propagate() {
        let round_trip = StorageRoundTrip::new(
            Arc::new(MemoryBlobServiceProvider::new()),
            Arc::new(NoCredentials),
        );
        let err = round_trip.run_at(&config(), at(5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Credential);
        assert_eq!(err.message(), "no managed identity available");
    }

    #[tokio::test]
    async fn missing_storage_path_is_a_configuration_failure() {
        let round_trip = StorageRoundTrip::new(
            Arc::new(MemoryBlobServiceProvider::new()),
            Arc::new(StubCredentials),
        );
        let config = SiteConfig::default();
        let err = round_trip.run_at(&config, at(6)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.message().is_empty());
    }

    #[tokio::test]
    async fn existing_container_and_blob_are_reused() {
        let memory = MemoryBlobServiceProvider::new();
        let container = memory.container("testcontainer");
        assert_eq!(container.create().await.unwrap(), CreateOutcome::Created);
        container
            .put_blob("storagetest.txt", b"old".to_vec())
            .await
            .unwrap();

        let ensured = ensure_container(&memory, "testcontainer").await.unwrap();
        ensure_blob(ensured.as_ref(), "storagetest.txt").await.unwrap();
        assert_eq!(memory.blob("testcontainer", "storagetest.txt").unwrap(), b"old");
    }

    #[tokio::test]
    async fn concurrent_create_is_not_an_error() {
        let memory = MemoryBlobServiceProvider::new();
        let container = memory.container("testcontainer");
        assert_eq!(container.create().await.unwrap(), CreateOutcome::Created);
        assert_eq!(container.create().await.unwrap(), CreateOutcome::AlreadyExists);
        assert_eq!(
            container.create_blob("storagetest.txt").await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            container.create_blob("storagetest.txt").await.unwrap(),
            CreateOutcome::AlreadyExists
        );
    }

    #[tokio::test]
    async fn losing_a_create_race_is_success() {
        let container = ensure_container(&Racing, "testcontainer").await.unwrap();
        assert_eq!(container.name(), "racing");
        ensure_blob(container.as_ref(), "storagetest.txt").await.unwrap();
    }
}
