use anyhow::{bail, Context};
use url::Url;

/// A backing service endpoint together with the account it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoint {
    url: Url,
    account: String,
}

impl ServiceEndpoint {
    /// Parses a full endpoint URL.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("invalid endpoint URL '{raw}'"))?;
        Self::from_url(url)
    }

    /// Parses a URL and keeps only its scheme, host and port.
    pub fn authority_of(raw: &str) -> anyhow::Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("invalid endpoint URL '{raw}'"))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            bail!("endpoint URL '{raw}' has no host");
        }
        let url = Url::parse(&origin.ascii_serialization())
            .with_context(|| format!("invalid endpoint URL '{raw}'"))?;
        Self::from_url(url)
    }

    fn from_url(url: Url) -> anyhow::Result<Self> {
        let Some(host) = url.host_str() else {
            bail!("endpoint URL '{url}' has no host");
        };
        let account = host.split('.').next().unwrap_or_default().to_owned();
        if account.is_empty() {
            bail!("cannot derive an account name from host '{host}'");
        }
        Ok(Self { url, account })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The account name, taken from the first label of the host.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The endpoint without a trailing slash.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}
