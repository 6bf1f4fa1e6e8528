//! An in-process document store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;

use crate::{DocumentClient, DocumentContainer, DocumentDatabase, DocumentStoreProvider, LogRecord};

type ContainerKey = (String, String);
type Records = HashMap<(String, String), LogRecord>;

/// Serves every connection from the same in-memory account.
///
/// Databases and containers are never created on demand: writing to one that
/// was not registered with [`MemoryDocumentStore::with_container`] fails.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    containers: Arc<Mutex<HashMap<ContainerKey, Records>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing database container.
    pub fn with_container(self, database: &str, container: &str) -> Self {
        if let Ok(mut containers) = self.containers.lock() {
            containers
                .entry((database.to_owned(), container.to_owned()))
                .or_default();
        }
        self
    }

    /// All records in a container, in no particular order.
    pub fn records(&self, database: &str, container: &str) -> Vec<LogRecord> {
        let Ok(containers) = self.containers.lock() else {
            return vec![];
        };
        containers
            .get(&(database.to_owned(), container.to_owned()))
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl DocumentStoreProvider for MemoryDocumentStore {
    fn connect(
        &self,
        _endpoint: &ServiceEndpoint,
        _credential: Credential,
    ) -> anyhow::Result<Arc<dyn DocumentClient>> {
        Ok(Arc::new(self.clone()))
    }
}

impl DocumentClient for MemoryDocumentStore {
    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase> {
        Arc::new(MemoryDatabase {
            name: name.to_owned(),
            store: self.clone(),
        })
    }
}

struct MemoryDatabase {
    name: String,
    store: MemoryDocumentStore,
}

impl DocumentDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self, name: &str) -> Arc<dyn DocumentContainer> {
        Arc::new(MemoryContainer {
            key: (self.name.clone(), name.to_owned()),
            store: self.store.clone(),
        })
    }
}

struct MemoryContainer {
    key: ContainerKey,
    store: MemoryDocumentStore,
}

impl MemoryContainer {
    fn with_records<T>(&self, f: impl FnOnce(&mut Records) -> T) -> anyhow::Result<T> {
        let mut containers = self
            .store
            .containers
            .lock()
            .map_err(|_| anyhow::anyhow!("memory document store lock poisoned"))?;
        let (database, container) = &self.key;
        let records = containers.get_mut(&self.key).ok_or_else(|| {
            anyhow::anyhow!("Resource Not Found: container '{container}' in database '{database}'")
        })?;
        Ok(f(records))
    }
}

#[async_trait]
impl DocumentContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.key.1
    }

    async fn upsert(&self, record: LogRecord) -> anyhow::Result<()> {
        self.with_records(|records| {
            // Partitioned on `/id`.
            records.insert((record.id.clone(), record.id.clone()), record);
        })
    }

    async fn read(&self, id: &str, partition_key: &str) -> anyhow::Result<Option<LogRecord>> {
        self.with_records(|records| {
            records
                .get(&(partition_key.to_owned(), id.to_owned()))
                .cloned()
        })
    }
}
