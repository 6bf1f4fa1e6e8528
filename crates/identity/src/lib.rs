//! Credential selection for the backing service clients.

mod managed_identity;

use std::sync::Arc;

use anyhow::Context as _;
use azure_core::auth::TokenCredential;

pub use managed_identity::{ManagedIdentityCredential, ManagedIdentityEndpoint};

/// A credential handle usable by the Azure client constructors.
pub type Credential = Arc<dyn TokenCredential>;

/// Which identity the backing service clients authenticate as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// A specific user-assigned managed identity.
    UserAssigned { client_id: String },
    /// The ambient default credential chain.
    ///
    /// This uses the Azure Rust SDK's default credential chain, which looks at
    /// the environment (`AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`,
    /// ...), a system-assigned managed identity and the Azure CLI.
    Default,
}

impl CredentialSource {
    /// Selects a user-assigned identity when a non-empty client id is given.
    pub fn from_client_id(client_id: Option<&str>) -> Self {
        match client_id {
            Some(id) if !id.is_empty() => Self::UserAssigned {
                client_id: id.to_owned(),
            },
            _ => Self::Default,
        }
    }

    /// Describes the credential for log lines.
    pub fn describe(&self) -> String {
        match self {
            Self::UserAssigned { client_id } => {
                format!(" from using user assigned identity {client_id}.")
            }
            Self::Default => " from using default credential.".to_owned(),
        }
    }

    /// Acquires a credential handle for this source.
    pub fn resolve(&self) -> anyhow::Result<Credential> {
        match self {
            Self::UserAssigned { client_id } => {
                let credential = ManagedIdentityCredential::from_env(client_id.clone())?;
                tracing::debug!(%client_id, endpoint = ?credential.endpoint(), "Using user assigned identity");
                Ok(Arc::new(credential))
            }
            Self::Default => azure_identity::create_default_credential()
                .context("failed to create the default Azure credential"),
        }
    }
}

/// Turns a [`CredentialSource`] into a credential handle.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self, source: &CredentialSource) -> anyhow::Result<Credential>;
}

/// Resolves credentials with the Azure identity stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct AzureCredentialProvider;

impl CredentialProvider for AzureCredentialProvider {
    fn credential(&self, source: &CredentialSource) -> anyhow::Result<Credential> {
        source.resolve()
    }
}
