use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use azure_data_cosmos::{
    prelude::{
        AuthorizationToken, CloudLocation, CollectionClient, CosmosClient, CosmosClientBuilder,
        DatabaseClient, GetDocumentResponse,
    },
    CosmosEntity,
};
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;
use tracing::{instrument, Level};

use crate::{DocumentClient, DocumentContainer, DocumentDatabase, DocumentStoreProvider, LogRecord};

/// Connects to Azure Cosmos DB with a token credential.
#[derive(Clone, Copy, Debug, Default)]
pub struct AzureDocumentStoreProvider;

impl DocumentStoreProvider for AzureDocumentStoreProvider {
    fn connect(
        &self,
        endpoint: &ServiceEndpoint,
        credential: Credential,
    ) -> anyhow::Result<Arc<dyn DocumentClient>> {
        let token = AuthorizationToken::from_token_credential(credential);
        let client = CosmosClientBuilder::with_location(cloud_location(endpoint, token)).build();
        Ok(Arc::new(AzureDocumentClient { client }))
    }
}

/// Targets the configured endpoint as given, host and port included.
fn cloud_location(endpoint: &ServiceEndpoint, auth_token: AuthorizationToken) -> CloudLocation {
    CloudLocation::Custom {
        uri: endpoint.base().to_owned(),
        auth_token,
    }
}

struct AzureDocumentClient {
    client: CosmosClient,
}

impl DocumentClient for AzureDocumentClient {
    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase> {
        Arc::new(AzureDatabase {
            name: name.to_owned(),
            client: self.client.database_client(name.to_owned()),
        })
    }
}

struct AzureDatabase {
    name: String,
    client: DatabaseClient,
}

impl DocumentDatabase for AzureDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self, name: &str) -> Arc<dyn DocumentContainer> {
        Arc::new(AzureContainer {
            name: name.to_owned(),
            client: self.client.collection_client(name.to_owned()),
        })
    }
}

struct AzureContainer {
    name: String,
    client: CollectionClient,
}

#[async_trait]
impl DocumentContainer for AzureContainer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "sampleweb_cosmos.upsert", level = Level::DEBUG, skip(self, record), fields(container = %self.name, id = %record.id), err(level = Level::INFO))]
    async fn upsert(&self, record: LogRecord) -> anyhow::Result<()> {
        self.client
            .create_document(record)
            .is_upsert(true)
            .await
            .with_context(|| format!("failed to upsert into container '{}'", self.name))?;
        Ok(())
    }

    #[instrument(name = "sampleweb_cosmos.read", level = Level::DEBUG, skip(self), fields(container = %self.name), err(level = Level::INFO))]
    async fn read(&self, id: &str, partition_key: &str) -> anyhow::Result<Option<LogRecord>> {
        let response = self
            .client
            .document_client(id, &partition_key)
            .context("invalid document partition key")?
            .get_document::<LogRecord>()
            .await
            .with_context(|| format!("failed to read document '{id}'"))?;
        match response {
            GetDocumentResponse::Found(found) => Ok(Some(found.document.document)),
            GetDocumentResponse::NotFound(_) => Ok(None),
        }
    }
}

impl CosmosEntity for LogRecord {
    type Entity = String;

    fn partition_key(&self) -> Self::Entity {
        self.id.clone()
    }
}
