//! An in-process blob store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Context as _;
use async_trait::async_trait;
use sampleweb_config::ServiceEndpoint;
use sampleweb_identity::Credential;

use crate::{BlobContainer, BlobService, BlobServiceProvider, CreateOutcome};

type Containers = HashMap<String, HashMap<String, Vec<u8>>>;

/// Serves every connection from the same in-memory account.
#[derive(Clone, Default)]
pub struct MemoryBlobServiceProvider {
    containers: Arc<Mutex<Containers>>,
}

impl MemoryBlobServiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content of a blob, if it exists.
    pub fn blob(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        let containers = self.containers.lock().ok()?;
        containers.get(container)?.get(name).cloned()
    }

    /// The number of blobs in a container, if it exists.
    pub fn blob_count(&self, container: &str) -> Option<usize> {
        let containers = self.containers.lock().ok()?;
        containers.get(container).map(HashMap::len)
    }
}

impl BlobServiceProvider for MemoryBlobServiceProvider {
    fn connect(
        &self,
        _endpoint: &ServiceEndpoint,
        _credential: Credential,
    ) -> anyhow::Result<Arc<dyn BlobService>> {
        Ok(Arc::new(self.clone()))
    }
}

impl BlobService for MemoryBlobServiceProvider {
    fn container(&self, name: &str) -> Arc<dyn BlobContainer> {
        Arc::new(MemoryContainer {
            name: name.to_owned(),
            containers: self.containers.clone(),
        })
    }
}

struct MemoryContainer {
    name: String,
    containers: Arc<Mutex<Containers>>,
}

impl MemoryContainer {
    fn with_blobs<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut containers = self
            .containers
            .lock()
            .map_err(|_| anyhow::anyhow!("memory blob store lock poisoned"))?;
        let blobs = containers
            .get_mut(&self.name)
            .with_context(|| format!("container '{}' does not exist", self.name))?;
        f(blobs)
    }
}

#[async_trait]
impl BlobContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> anyhow::Result<bool> {
        let containers = self
            .containers
            .lock()
            .map_err(|_| anyhow::anyhow!("memory blob store lock poisoned"))?;
        Ok(containers.contains_key(&self.name))
    }

    async fn create(&self) -> anyhow::Result<CreateOutcome> {
        let mut containers = self
            .containers
            .lock()
            .map_err(|_| anyhow::anyhow!("memory blob store lock poisoned"))?;
        if containers.contains_key(&self.name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        containers.insert(self.name.clone(), HashMap::new());
        Ok(CreateOutcome::Created)
    }

    async fn has_blob(&self, name: &str) -> anyhow::Result<bool> {
        self.with_blobs(|blobs| Ok(blobs.contains_key(name)))
    }

    async fn create_blob(&self, name: &str) -> anyhow::Result<CreateOutcome> {
        self.with_blobs(|blobs| {
            if blobs.contains_key(name) {
                return Ok(CreateOutcome::AlreadyExists);
            }
            blobs.insert(name.to_owned(), Vec::new());
            Ok(CreateOutcome::Created)
        })
    }

    async fn put_blob(&self, name: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.with_blobs(|blobs| {
            blobs.insert(name.to_owned(), data);
            Ok(())
        })
    }

    async fn get_blob(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.with_blobs(|blobs| {
            blobs
                .get(name)
                .cloned()
                .with_context(|| format!("blob '{name}' does not exist"))
        })
    }
}
