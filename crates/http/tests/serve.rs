use std::sync::Arc;

use sampleweb_config::SiteConfig;
use sampleweb_http::{Backends, ErrorStatusPolicy, HttpServer};
use tokio::net::TcpListener;

fn site_config() -> SiteConfig {
    SiteConfig {
        hostname: Some("sample-msha.azurewebsites.net".into()),
        storage_config_path: Some("https://acct.blob.core.windows.net/cfg.json".into()),
        cosmos_endpoint: Some("https://acct.documents.azure.com:443/".into()),
        cosmos_database: Some("otherdb".into()),
        ..Default::default()
    }
}

async fn start() -> anyhow::Result<String> {
    let config = site_config();
    let backends = Backends::in_memory(&config);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = Arc::new(HttpServer::new(
        addr,
        Arc::new(config),
        backends,
        ErrorStatusPolicy::Status,
    ));
    tokio::spawn(server.serve_listener(listener));
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn serves_index_and_storage_over_tcp() -> anyhow::Result<()> {
    let base = start().await?;
    let client = reqwest::Client::new();

    let index = client.get(format!("{base}/")).send().await?;
    assert_eq!(index.status(), reqwest::StatusCode::OK);
    assert!(index.text().await?.contains("Dedicated MSHA"));

    for _ in 0..2 {
        let storage = client.get(format!("{base}/?handler=Storage")).send().await?;
        assert_eq!(storage.status(), reqwest::StatusCode::OK);
        let text = storage.text().await?;
        assert!(text.starts_with('['));
        assert!(text.contains("This is a log message from Dedicated MSHA"));
        assert_eq!(text.matches('\n').count(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn cosmos_database_override_is_used() -> anyhow::Result<()> {
    let base = start().await?;
    let res = reqwest::get(format!("{base}/?handler=Cosmos")).await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert!(res.text().await?.contains("Dedicated MSHA"));
    Ok(())
}

#[tokio::test]
async fn unknown_path_is_not_found() -> anyhow::Result<()> {
    let base = start().await?;
    let res = reqwest::get(format!("{base}/nope")).await?;
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    Ok(())
}
