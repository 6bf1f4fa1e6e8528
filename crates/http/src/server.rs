use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use bytes::Bytes;
use http::{header, Method, Request, Response, StatusCode};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use sampleweb_blob::StorageRoundTrip;
use sampleweb_common::RoundTripResult;
use sampleweb_config::SiteConfig;
use sampleweb_cosmos::CosmosRoundTrip;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    task,
};
use tracing::Instrument;

use crate::{
    instrument::{finalize_http_span, http_span, instrument_error, MatchedRoute},
    page,
    routes::{is_index_path, PageHandler},
    Backends, Body, ErrorStatusPolicy, WELL_KNOWN_PREFIX,
};

/// An HTTP server which serves the sample site.
pub struct HttpServer {
    /// The address the server is listening on.
    listen_addr: SocketAddr,
    /// Read once at startup and shared by every request.
    config: Arc<SiteConfig>,
    storage: StorageRoundTrip,
    cosmos: CosmosRoundTrip,
    error_policy: ErrorStatusPolicy,
}

impl HttpServer {
    /// Create a new [`HttpServer`].
    pub fn new(
        listen_addr: SocketAddr,
        config: Arc<SiteConfig>,
        backends: Backends,
        error_policy: ErrorStatusPolicy,
    ) -> Self {
        let Backends {
            blob,
            documents,
            credentials,
        } = backends;
        Self {
            listen_addr,
            config,
            storage: StorageRoundTrip::new(blob, credentials.clone()),
            cosmos: CosmosRoundTrip::new(documents, credentials),
            error_policy,
        }
    }

    /// Binds the configured address and serves requests until the task is dropped.
    pub async fn serve(self: Arc<Self>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.listen_addr).await.with_context(|| {
            format!(
                "Unable to listen on {listen_addr}",
                listen_addr = self.listen_addr
            )
        })?;
        self.serve_listener(listener).await
    }

    /// Serve incoming requests over the provided [`TcpListener`].
    pub async fn serve_listener(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Serving http://{local_addr}");
        loop {
            let (stream, client_addr) = listener.accept().await?;
            self.clone().serve_connection(stream, client_addr);
        }
    }

    /// Handles a request.
    ///
    /// Only the method, path and query matter; request bodies are ignored.
    pub async fn handle<B>(self: &Arc<Self>, req: Request<B>) -> anyhow::Result<Response<Body>> {
        let path = req.uri().path().to_owned();
        tracing::info!("Processing request on path '{path}'");

        if let Some(well_known) = path.strip_prefix(WELL_KNOWN_PREFIX) {
            return match well_known {
                "health" => Ok(MatchedRoute::with_response_extension(
                    text_response(StatusCode::OK, "OK")?,
                    "/.well-known/sampleweb/health",
                )),
                _ => not_found(),
            };
        }

        if !is_index_path(&path) {
            return not_found();
        }
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header(header::ALLOW, "GET, HEAD")
                .body(Body::default())?);
        }

        let Some(handler) = PageHandler::from_query(req.uri().query()) else {
            return not_found();
        };

        let response = match handler {
            PageHandler::Index => self.index()?,
            PageHandler::Storage => {
                let result = self.storage.run(&self.config).await;
                self.round_trip_response(result)?
            }
            PageHandler::Cosmos => {
                let result = self.cosmos.run(&self.config).await;
                self.round_trip_response(result)?
            }
        };
        Ok(MatchedRoute::with_response_extension(
            response,
            handler.route(),
        ))
    }

    fn index(&self) -> anyhow::Result<Response<Body>> {
        let html = page::render_index(&self.config.display_info());
        Ok(Response::builder()
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Body::new(Bytes::from(html)))?)
    }

    fn round_trip_response(&self, result: RoundTripResult) -> anyhow::Result<Response<Body>> {
        match result {
            Ok(text) => text_response(StatusCode::OK, text),
            Err(err) => {
                tracing::error!(kind = %err.kind(), "Round trip failed: {}", err.message());
                instrument_error(&err);
                text_response(self.error_policy.status_for(err.kind()), err.user_message())
            }
        }
    }

    fn serve_connection<S: AsyncRead + AsyncWrite + Unpin + Send + 'static>(
        self: Arc<Self>,
        stream: S,
        client_addr: SocketAddr,
    ) {
        task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .keep_alive(true)
                .serve_connection(
                    TokioIo::new(stream),
                    service_fn(move |request| {
                        self.clone().instrumented_service_fn(client_addr, request)
                    }),
                )
                .await
            {
                tracing::warn!("Error serving HTTP connection: {err:?}");
            }
        });
    }

    async fn instrumented_service_fn(
        self: Arc<Self>,
        client_addr: SocketAddr,
        request: Request<Incoming>,
    ) -> anyhow::Result<Response<Body>> {
        let span = http_span!(request, client_addr);
        async { finalize_http_span(self.handle(request).await) }
            .instrument(span)
            .await
    }
}

fn text_response(status: StatusCode, text: impl Into<Bytes>) -> anyhow::Result<Response<Body>> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::new(text.into()))?)
}

/// Creates an HTTP 404 response.
fn not_found() -> anyhow::Result<Response<Body>> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::default())?)
}
