use std::{
    collections::HashMap,
    env::VarError,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    SiteConfig, COSMOS_CONTAINER_VAR, COSMOS_DATABASE_VAR, COSMOS_ENDPOINT_VAR, HOSTNAME_VAR,
    SKU_VAR, STORAGE_CONFIG_PATH_VAR, USER_ASSIGNED_CLIENT_ID_VAR,
};

pub type EnvFetcherFn = Box<dyn Fn(&str) -> Result<String, VarError> + Send + Sync>;

/// Builds a [`SiteConfig`] from environment variables.
///
/// Variables that are not present in the environment are looked up in an
/// optional dotenv file.
pub struct EnvConfigLoader {
    env_fetcher: EnvFetcherFn,
    dotenv_path: Option<PathBuf>,
}

impl Default for EnvConfigLoader {
    fn default() -> Self {
        Self {
            env_fetcher: Box::new(|s| std::env::var(s)),
            dotenv_path: Some(".env".into()),
        }
    }
}

impl EnvConfigLoader {
    /// Creates a new loader.
    ///
    /// * `env_fetcher` - The function to use to fetch an environment variable.
    /// * `dotenv_path` - The path to the .env file to load missing variables
    ///   from. If not set, no .env file is loaded.
    pub fn new(
        env_fetcher: impl Fn(&str) -> Result<String, VarError> + Send + Sync + 'static,
        dotenv_path: Option<PathBuf>,
    ) -> Self {
        Self {
            env_fetcher: Box::new(env_fetcher),
            dotenv_path,
        }
    }

    pub fn load(&self) -> anyhow::Result<SiteConfig> {
        let dotenv = match self.dotenv_path.as_deref() {
            Some(path) if path.exists() => load_dotenv(path)?,
            _ => HashMap::new(),
        };
        let get = |key: &str| self.query_env(key, &dotenv);

        let config = SiteConfig {
            hostname: get(HOSTNAME_VAR)?,
            sku: get(SKU_VAR)?,
            user_assigned_client_id: get(USER_ASSIGNED_CLIENT_ID_VAR)?,
            storage_config_path: get(STORAGE_CONFIG_PATH_VAR)?,
            cosmos_endpoint: get(COSMOS_ENDPOINT_VAR)?,
            cosmos_database: get(COSMOS_DATABASE_VAR)?,
            cosmos_container: get(COSMOS_CONTAINER_VAR)?,
        };
        tracing::debug!(?config, "Loaded site configuration");
        Ok(config)
    }

    fn query_env(
        &self,
        key: &str,
        dotenv: &HashMap<String, String>,
    ) -> anyhow::Result<Option<String>> {
        match (self.env_fetcher)(key) {
            Err(VarError::NotPresent) => Ok(dotenv.get(key).cloned()),
            other => other
                .map(Some)
                .with_context(|| format!("failed to resolve env var {key}")),
        }
    }
}

impl std::fmt::Debug for EnvConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfigLoader")
            .field("dotenv_path", &self.dotenv_path)
            .finish()
    }
}

fn load_dotenv(dotenv_path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let entries = dotenvy::from_path_iter(dotenv_path)
        .with_context(|| format!("failed to read {}", dotenv_path.display()))?;
    Ok(entries.collect::<Result<HashMap<String, String>, _>>()?)
}
