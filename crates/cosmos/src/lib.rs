//! The Cosmos DB round trip.

mod azure;
pub mod memory;
mod round_trip;

use std::sync::Arc;

use async_trait::async_trait;
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;
use serde::{Deserialize, Serialize};

pub use azure::AzureDocumentStoreProvider;
pub use round_trip::{generate_id, CosmosRoundTrip};

/// A log entry stored in the document database.
///
/// The container must use `/id` as its partition key path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub id: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Builds document database clients.
pub trait DocumentStoreProvider: Send + Sync {
    fn connect(
        &self,
        endpoint: &ServiceEndpoint,
        credential: Credential,
    ) -> anyhow::Result<Arc<dyn DocumentClient>>;
}

/// A database account.
pub trait DocumentClient: Send + Sync {
    /// Returns a handle to an existing database. No request is made.
    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase>;
}

pub trait DocumentDatabase: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a handle to an existing container. No request is made.
    fn container(&self, name: &str) -> Arc<dyn DocumentContainer>;
}

/// A container of log records.
#[async_trait]
pub trait DocumentContainer: Send + Sync {
    fn name(&self) -> &str;

    /// Inserts the record or replaces the one with the same id.
    async fn upsert(&self, record: LogRecord) -> anyhow::Result<()>;

    async fn read(&self, id: &str, partition_key: &str) -> anyhow::Result<Option<LogRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_stored_field_names() {
        let record = LogRecord {
            id: "1".into(),
            content: "hello".into(),
            date: "3/7/2024 4:05:09 PM".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "1", "Content": "hello", "Date": "3/7/2024 4:05:09 PM"})
        );
    }
}
