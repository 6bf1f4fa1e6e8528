use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use sampleweb_common::{log_line, ErrorKind, RoundTripError, RoundTripResult, WithKind};
use sampleweb_config::SiteConfig;
use sampleweb_identity::{CredentialProvider, CredentialSource};

use crate::{DocumentStoreProvider, LogRecord};

/// Generates a new record id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Upserts a freshly keyed log record and reads it back.
///
/// Each run writes a new record: the id is generated per call, so the read
/// only ever observes the record written by the same call.
pub struct CosmosRoundTrip {
    provider: Arc<dyn DocumentStoreProvider>,
    credentials: Arc<dyn CredentialProvider>,
}

impl CosmosRoundTrip {
    pub fn new(
        provider: Arc<dyn DocumentStoreProvider>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            provider,
            credentials,
        }
    }

    pub async fn run(&self, config: &SiteConfig) -> RoundTripResult {
        self.run_at(config, Local::now()).await
    }

    pub async fn run_at(&self, config: &SiteConfig, now: DateTime<Local>) -> RoundTripResult {
        let endpoint = config.cosmos_endpoint().kind(ErrorKind::Configuration)?;
        let source = CredentialSource::from_client_id(config.user_assigned_client_id());
        let credential = self
            .credentials
            .credential(&source)
            .kind(ErrorKind::Credential)?;
        let client = self
            .provider
            .connect(&endpoint, credential)
            .kind(ErrorKind::Configuration)?;

        let database = client.database(config.cosmos_database());
        let container = database.container(config.cosmos_container());
        tracing::debug!(
            database = database.name(),
            container = container.name(),
            "Resolved document container"
        );

        let id = generate_id();
        let record = LogRecord {
            id: id.clone(),
            content: log_line::document_log_content(
                &now,
                config.site_label().as_str(),
                &source.describe(),
            ),
            date: log_line::timestamp(&now.with_timezone(&Utc)),
        };
        container.upsert(record).await.kind(ErrorKind::Write)?;

        let found = container.read(&id, &id).await.kind(ErrorKind::Read)?;
        let record = found.ok_or_else(|| {
            RoundTripError::new(
                ErrorKind::NotFound,
                format!(
                    "record '{id}' was not found in container '{}' right after it was written",
                    container.name()
                ),
            )
        })?;
        Ok(format!("{}\n", record.content))
    }
}
