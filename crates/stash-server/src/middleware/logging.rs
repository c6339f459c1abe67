//! Middleware de logging estructurado.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, Response},
};
use tower::{Layer, Service};
use tracing::{Instrument, Span, debug, field, info, info_span, warn};

use super::ResponseFuture;
use super::request_id::REQUEST_ID_HEADER;

/// Layer que abre un span `http_request` por request.
///
/// El span lleva `request_id`, `method` y `path`; `status` y `duration_ms`
/// se registran al completar.
#[derive(Clone, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware { inner }
    }
}

/// Middleware de logging de request/response.
#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

fn request_span(request: &Request<Body>) -> Span {
    // Lo asigna RequestIdMiddleware, que va antes en el stack
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        status = field::Empty,
        duration_ms = field::Empty,
    )
}

impl<S> Service<Request<Body>> for LoggingMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let span = request_span(&request);
        let started = Instant::now();
        let future = self.inner.call(request);

        Box::pin(
            async move {
                debug!("Request started");
                let response = future.await?;

                let status = response.status();
                let span = Span::current();
                span.record("status", status.as_u16());
                span.record("duration_ms", started.elapsed().as_millis() as u64);

                if status.is_server_error() {
                    warn!("Request failed");
                } else {
                    info!("Request completed");
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
