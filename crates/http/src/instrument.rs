use anyhow::Result;
use http::Response;
use tracing::Level;

use crate::Body;

/// Create a span for an HTTP request.
macro_rules! http_span {
    ($request:tt, $addr:tt) => {
        tracing::info_span!(
            "sampleweb_http.handle_http_request",
            "http.request.method" = %$request.method(),
            "network.peer.address" = %$addr.ip(),
            "network.peer.port" = %$addr.port(),
            "url.path" = $request.uri().path(),
            "url.query" = $request.uri().query().unwrap_or(""),
            "client.address" = $request.headers().get("x-forwarded-for").and_then(|val| val.to_str().ok()),
            // Recorded later
            "error.type" = ::tracing::field::Empty,
            "http.response.status_code" = ::tracing::field::Empty,
            "http.route" = ::tracing::field::Empty,
        )
    };
}

pub(crate) use http_span;

/// Finish setting attributes on the HTTP span.
pub(crate) fn finalize_http_span(response: Result<Response<Body>>) -> Result<Response<Body>> {
    let span = tracing::Span::current();
    match response {
        Ok(response) => {
            tracing::info!(
                "Request finished, sending response with status code {}",
                response.status()
            );
            if let Some(MatchedRoute { route }) = response.extensions().get::<MatchedRoute>() {
                span.record("http.route", *route);
            }
            span.record("http.response.status_code", response.status().as_u16());
            Ok(response)
        }
        Err(err) => {
            instrument_error(&err);
            span.record("http.response.status_code", 500);
            Err(err)
        }
    }
}

/// Marks the current span as errored.
pub(crate) fn instrument_error(err: &dyn std::fmt::Display) {
    let span = tracing::Span::current();
    tracing::event!(target:module_path!(), Level::INFO, error = %err);
    span.record("error.type", err.to_string());
}

/// MatchedRoute is used as a response extension to track the route that was
/// matched for tracing purposes.
#[derive(Clone, Copy)]
pub struct MatchedRoute {
    pub route: &'static str,
}

impl MatchedRoute {
    pub fn with_response_extension(mut resp: Response<Body>, route: &'static str) -> Response<Body> {
        resp.extensions_mut().insert(MatchedRoute { route });
        resp
    }
}
