use anyhow::{bail, Context as _};
use azure_core::{
    auth::{AccessToken, Secret, TokenCredential},
    error::{Error, ErrorKind},
};
use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use url::Url;

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

const IDENTITY_ENDPOINT_VAR: &str = "IDENTITY_ENDPOINT";
const IDENTITY_HEADER_VAR: &str = "IDENTITY_HEADER";

/// Where managed identity tokens are requested from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagedIdentityEndpoint {
    /// The App Service / Container Apps identity endpoint.
    AppService { endpoint: Url, header: String },
    /// The instance metadata service.
    Imds,
}

impl ManagedIdentityEndpoint {
    /// Picks the endpoint advertised by the hosting platform.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let endpoint = lookup(IDENTITY_ENDPOINT_VAR).filter(|s| !s.is_empty());
        let header = lookup(IDENTITY_HEADER_VAR).filter(|s| !s.is_empty());
        match (endpoint, header) {
            (Some(endpoint), Some(header)) => Ok(Self::AppService {
                endpoint: Url::parse(&endpoint)
                    .with_context(|| format!("invalid {IDENTITY_ENDPOINT_VAR} '{endpoint}'"))?,
                header,
            }),
            (None, None) => Ok(Self::Imds),
            _ => bail!(
                "only one of {IDENTITY_ENDPOINT_VAR} and {IDENTITY_HEADER_VAR} is set; set both to use the platform identity endpoint, or neither to use IMDS"
            ),
        }
    }

    fn token_url(&self, resource: &str, client_id: &str) -> anyhow::Result<Url> {
        let (mut url, api_version) = match self {
            Self::AppService { endpoint, .. } => (endpoint.clone(), APP_SERVICE_API_VERSION),
            Self::Imds => (Url::parse(IMDS_ENDPOINT)?, IMDS_API_VERSION),
        };
        url.query_pairs_mut()
            .append_pair("api-version", api_version)
            .append_pair("resource", resource)
            .append_pair("client_id", client_id);
        Ok(url)
    }
}

/// A token credential for a user-assigned managed identity.
#[derive(Clone, Debug)]
pub struct ManagedIdentityCredential {
    client_id: String,
    endpoint: ManagedIdentityEndpoint,
    http: reqwest::Client,
}

impl ManagedIdentityCredential {
    pub fn new(client_id: impl Into<String>, endpoint: ManagedIdentityEndpoint) -> Self {
        Self {
            client_id: client_id.into(),
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a credential using the endpoint advertised in the process environment.
    pub fn from_env(client_id: impl Into<String>) -> anyhow::Result<Self> {
        let endpoint = ManagedIdentityEndpoint::from_lookup(|key| std::env::var(key).ok())?;
        Ok(Self::new(client_id, endpoint))
    }

    pub fn endpoint(&self) -> &ManagedIdentityEndpoint {
        &self.endpoint
    }

    async fn fetch_token(&self, scopes: &[&str]) -> anyhow::Result<TokenResponse> {
        let [scope] = scopes else {
            bail!("managed identity tokens need exactly one scope, got {}", scopes.len());
        };
        let resource = scope_to_resource(scope);
        let url = self.endpoint.token_url(resource, &self.client_id)?;

        let request = match &self.endpoint {
            ManagedIdentityEndpoint::AppService { header, .. } => {
                self.http.get(url).header("X-IDENTITY-HEADER", header)
            }
            ManagedIdentityEndpoint::Imds => self.http.get(url).header("Metadata", "true"),
        };
        let response = request
            .send()
            .await
            .context("failed to reach the managed identity endpoint")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("managed identity endpoint returned {status}: {body}");
        }
        response
            .json::<TokenResponse>()
            .await
            .context("invalid managed identity token response")
    }
}

#[async_trait::async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, scopes: &[&str]) -> azure_core::Result<AccessToken> {
        let response = self.fetch_token(scopes).await.map_err(|err| {
            Error::message(
                ErrorKind::Credential,
                format!(
                    "user assigned identity {} could not get a token: {err:#}",
                    self.client_id
                ),
            )
        })?;
        let expires_on = OffsetDateTime::from_unix_timestamp(response.expires_on)
            .map_err(|err| Error::new(ErrorKind::DataConversion, err))?;
        Ok(AccessToken::new(Secret::new(response.access_token), expires_on))
    }

    async fn clear_cache(&self) -> azure_core::Result<()> {
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "unix_seconds")]
    expires_on: i64,
}

/// Token endpoints report `expires_on` either as a number or a numeric string.
fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }
    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn endpoint_defaults_to_imds() {
        assert_eq!(
            ManagedIdentityEndpoint::from_lookup(lookup(&[])).unwrap(),
            ManagedIdentityEndpoint::Imds
        );
    }

    #[test]
    fn endpoint_uses_app_service_when_advertised() {
        let endpoint = ManagedIdentityEndpoint::from_lookup(lookup(&[
            ("IDENTITY_ENDPOINT", "http://localhost:42356/msi/token"),
            ("IDENTITY_HEADER", "secret"),
        ]))
        .unwrap();
        let ManagedIdentityEndpoint::AppService { endpoint, header } = endpoint else {
            panic!("expected app service endpoint");
        };
        assert_eq!(endpoint.as_str(), "http://localhost:42356/msi/token");
        assert_eq!(header, "secret");
    }

    #[test]
    fn endpoint_rejects_half_configuration() {
        let res = ManagedIdentityEndpoint::from_lookup(lookup(&[(
            "IDENTITY_ENDPOINT",
            "http://localhost:42356/msi/token",
        )]));
        assert!(res.is_err());
    }

    #[test]
    fn imds_token_url() {
        let url = ManagedIdentityEndpoint::Imds
            .token_url("https://storage.azure.com", "abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=https%3A%2F%2Fstorage.azure.com&client_id=abc"
        );
    }

    #[test]
    fn strips_default_scope_suffix() {
        assert_eq!(
            scope_to_resource("https://storage.azure.com/.default"),
            "https://storage.azure.com"
        );
        assert_eq!(scope_to_resource("https://x"), "https://x");
    }

    #[test]
    fn token_response_accepts_string_or_number_expiry() {
        let text: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_on":"1700000000"}"#).unwrap();
        assert_eq!(text.expires_on, 1_700_000_000);
        let number: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_on":1700000001,"token_type":"Bearer"}"#)
                .unwrap();
        assert_eq!(number.expires_on, 1_700_000_001);
    }
}
