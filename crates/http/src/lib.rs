//! The sample site's HTTP surface.

mod instrument;
mod page;
mod routes;
mod server;

use std::{fmt, str::FromStr, sync::Arc};

use bytes::Bytes;
use http::StatusCode;
use sampleweb_blob::{memory::MemoryBlobServiceProvider, AzureBlobServiceProvider, BlobServiceProvider};
use sampleweb_common::ErrorKind;
use sampleweb_config::SiteConfig;
use sampleweb_cosmos::{memory::MemoryDocumentStore, AzureDocumentStoreProvider, DocumentStoreProvider};
use sampleweb_identity::{AzureCredentialProvider, CredentialProvider};

pub use routes::PageHandler;
pub use server::HttpServer;

/// Response body type used by the server.
pub type Body = http_body_util::Full<Bytes>;

/// Well-known path prefix for server-level endpoints.
pub const WELL_KNOWN_PREFIX: &str = "/.well-known/sampleweb/";

/// How failed round trips map to HTTP status codes.
///
/// The body always carries the apology text followed by the failure message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorStatusPolicy {
    /// Failures are reported with `200 OK`; only the body tells them apart.
    #[default]
    Ok,
    /// Failures get a status derived from the kind of failure.
    Status,
}

impl ErrorStatusPolicy {
    pub fn status_for(&self, kind: ErrorKind) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Status => match kind {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                kind if kind.is_local() => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl FromStr for ErrorStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "status" => Ok(Self::Status),
            other => Err(format!(
                "unknown error status policy '{other}', expected 'ok' or 'status'"
            )),
        }
    }
}

impl fmt::Display for ErrorStatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Status => "status",
        })
    }
}

/// The backing services and credentials the handlers talk to.
#[derive(Clone)]
pub struct Backends {
    pub blob: Arc<dyn BlobServiceProvider>,
    pub documents: Arc<dyn DocumentStoreProvider>,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl Backends {
    /// Azure Blob Storage and Azure Cosmos DB.
    pub fn azure() -> Self {
        Self {
            blob: Arc::new(AzureBlobServiceProvider),
            documents: Arc::new(AzureDocumentStoreProvider),
            credentials: Arc::new(AzureCredentialProvider),
        }
    }

    /// In-process stores; the configured Cosmos database and container are
    /// registered up front so the document round trip can find them.
    pub fn in_memory(config: &SiteConfig) -> Self {
        let documents = MemoryDocumentStore::new()
            .with_container(config.cosmos_database(), config.cosmos_container());
        Self {
            blob: Arc::new(MemoryBlobServiceProvider::new()),
            documents: Arc::new(documents),
            credentials: Arc::new(AzureCredentialProvider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_policy_always_reports_success() {
        for kind in [ErrorKind::Configuration, ErrorKind::Write, ErrorKind::NotFound] {
            assert_eq!(ErrorStatusPolicy::Ok.status_for(kind), StatusCode::OK);
        }
    }

    #[test]
    fn status_policy_maps_kinds() {
        let policy = ErrorStatusPolicy::Status;
        assert_eq!(
            policy.status_for(ErrorKind::Credential),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(policy.status_for(ErrorKind::Provision), StatusCode::BAD_GATEWAY);
        assert_eq!(policy.status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parse_policy() {
        assert_eq!("ok".parse::<ErrorStatusPolicy>().unwrap(), ErrorStatusPolicy::Ok);
        assert_eq!(
            "status".parse::<ErrorStatusPolicy>().unwrap(),
            ErrorStatusPolicy::Status
        );
        assert!("teapot".parse::<ErrorStatusPolicy>().is_err());
    }
}
