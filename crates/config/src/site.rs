use std::fmt;

use crate::SiteConfig;

const UNKNOWN_HOST: &str = "local or unknown";
const UNKNOWN_SKU: &str = "Unknown";

/// The kind of deployment the site is running in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteLabel {
    DedicatedMsha,
    DedicatedCds,
    SampleContainerWeb,
    /// No hostname was provided, e.g. running locally.
    SampleContainer,
}

impl SiteLabel {
    /// Derives the label from a case-insensitive match on the hostname.
    pub fn from_hostname(hostname: Option<&str>) -> Self {
        let Some(hostname) = hostname.filter(|h| !h.is_empty()) else {
            return Self::SampleContainer;
        };
        let hostname = hostname.to_lowercase();
        if hostname.contains("msha") {
            Self::DedicatedMsha
        } else if hostname.contains("cds") {
            Self::DedicatedCds
        } else {
            Self::SampleContainerWeb
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DedicatedMsha => "Dedicated MSHA",
            Self::DedicatedCds => "Dedicated CDS",
            Self::SampleContainerWeb => "Sample Container Web",
            Self::SampleContainer => "Sample Container",
        }
    }
}

impl fmt::Display for SiteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields rendered on the landing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayInfo {
    pub host: String,
    pub site: SiteLabel,
    pub sku: String,
    pub user_assigned_client_id: String,
    pub storage_config_path: String,
    pub cosmos_endpoint: String,
}

impl DisplayInfo {
    pub fn new(config: &SiteConfig) -> Self {
        let host = config.hostname().unwrap_or(UNKNOWN_HOST).to_owned();
        let sku = config
            .sku
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SKU)
            .to_owned();
        Self {
            host,
            site: config.site_label(),
            sku,
            user_assigned_client_id: config.user_assigned_client_id.clone().unwrap_or_default(),
            storage_config_path: config.storage_config_path.clone().unwrap_or_default(),
            cosmos_endpoint: config.cosmos_endpoint.clone().unwrap_or_default(),
        }
    }
}
