//! Deployment configuration for the sample site.
//!
//! The configuration is read once from the process environment at startup and
//! then shared read-only with every request handler.

mod endpoint;
mod env;
mod site;

pub use endpoint::ServiceEndpoint;
pub use env::{EnvConfigLoader, EnvFetcherFn};
pub use site::{DisplayInfo, SiteLabel};

/// Deployment hostname.
pub const HOSTNAME_VAR: &str = "WEBSITE_HOSTNAME";
/// Dedicated SKU flag.
pub const SKU_VAR: &str = "IsDedicated";
/// Client id of the user-assigned managed identity.
pub const USER_ASSIGNED_CLIENT_ID_VAR: &str = "UserAssignedClientId";
/// Storage account configuration file path; only its scheme, host and port are used.
pub const STORAGE_CONFIG_PATH_VAR: &str = "AdminStorageAccountConfigurationFilePath";
/// Cosmos DB account endpoint.
pub const COSMOS_ENDPOINT_VAR: &str = "CosmosConnectionString";
/// Cosmos DB database name override.
pub const COSMOS_DATABASE_VAR: &str = "CosmosDatabaseName";
/// Cosmos DB container name override.
pub const COSMOS_CONTAINER_VAR: &str = "CosmosContainerName";

pub const DEFAULT_BLOB_CONTAINER: &str = "testcontainer";
pub const DEFAULT_BLOB_NAME: &str = "storagetest.txt";
pub const DEFAULT_COSMOS_DATABASE: &str = "dswadb";
pub const DEFAULT_COSMOS_CONTAINER: &str = "cosmostest";

/// Everything the site reads from its deployment environment.
///
/// Values are kept exactly as found so they can be displayed verbatim; use the
/// accessor methods to get the effective values with empty strings treated as
/// unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteConfig {
    pub hostname: Option<String>,
    pub sku: Option<String>,
    pub user_assigned_client_id: Option<String>,
    pub storage_config_path: Option<String>,
    pub cosmos_endpoint: Option<String>,
    pub cosmos_database: Option<String>,
    pub cosmos_container: Option<String>,
}

impl SiteConfig {
    /// Loads the configuration from the process environment, falling back to
    /// a `.env` file in the working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        EnvConfigLoader::default().load()
    }

    pub fn hostname(&self) -> Option<&str> {
        non_empty(&self.hostname)
    }

    pub fn user_assigned_client_id(&self) -> Option<&str> {
        non_empty(&self.user_assigned_client_id)
    }

    /// The site label derived from the hostname.
    pub fn site_label(&self) -> SiteLabel {
        SiteLabel::from_hostname(self.hostname())
    }

    /// The values shown on the landing page.
    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new(self)
    }

    /// The blob service endpoint derived from the storage configuration path.
    pub fn storage_endpoint(&self) -> anyhow::Result<ServiceEndpoint> {
        let raw = non_empty(&self.storage_config_path).ok_or_else(|| {
            anyhow::anyhow!("environment variable {STORAGE_CONFIG_PATH_VAR} is not set")
        })?;
        ServiceEndpoint::authority_of(raw)
    }

    /// The Cosmos DB account endpoint.
    pub fn cosmos_endpoint(&self) -> anyhow::Result<ServiceEndpoint> {
        let raw = non_empty(&self.cosmos_endpoint).ok_or_else(|| {
            anyhow::anyhow!("environment variable {COSMOS_ENDPOINT_VAR} is not set")
        })?;
        ServiceEndpoint::parse(raw)
    }

    pub fn cosmos_database(&self) -> &str {
        non_empty(&self.cosmos_database).unwrap_or(DEFAULT_COSMOS_DATABASE)
    }

    pub fn cosmos_container(&self) -> &str {
        non_empty(&self.cosmos_container).unwrap_or(DEFAULT_COSMOS_CONTAINER)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmos_names_default_when_unset_or_empty() {
        let config = SiteConfig {
            cosmos_database: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.cosmos_database(), "dswadb");
        assert_eq!(config.cosmos_container(), "cosmostest");
    }

    #[test]
    fn cosmos_names_use_overrides() {
        let config = SiteConfig {
            cosmos_database: Some("otherdb".into()),
            cosmos_container: Some("othercontainer".into()),
            ..Default::default()
        };
        assert_eq!(config.cosmos_database(), "otherdb");
        assert_eq!(config.cosmos_container(), "othercontainer");
    }

    #[test]
    fn empty_client_id_is_unset() {
        let config = SiteConfig {
            user_assigned_client_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.user_assigned_client_id(), None);
    }

    #[test]
    fn missing_storage_path_is_an_error() {
        let err = SiteConfig::default().storage_endpoint().unwrap_err();
        assert!(err.to_string().contains(STORAGE_CONFIG_PATH_VAR));
    }
}
