//! Middleware que dispara el sweep de entries expiradas.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, Response},
};
use stash_store::SweepTrigger;
use tower::{Layer, Service};
use tracing::debug;

/// Layer que consulta el [`SweepTrigger`] en cada request.
///
/// El sweep corre como tarea separada: la request nunca lo espera y sus
/// errores solo llegan al log y al estado del sweep.
#[derive(Clone)]
pub struct SweepLayer {
    trigger: Arc<SweepTrigger>,
}

impl SweepLayer {
    /// Crea el layer sobre un trigger compartido.
    pub fn new(trigger: Arc<SweepTrigger>) -> Self {
        Self { trigger }
    }
}

impl<S> Layer<S> for SweepLayer {
    type Service = SweepMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SweepMiddleware {
            inner,
            trigger: Arc::clone(&self.trigger),
        }
    }
}

/// Middleware que dispara un sweep cuando vence el intervalo.
#[derive(Clone)]
pub struct SweepMiddleware<S> {
    inner: S,
    trigger: Arc<SweepTrigger>,
}

impl<S> Service<Request<Body>> for SweepMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if self.trigger.maybe_sweep() {
            debug!(path = %request.uri().path(), "Sweep spawned from request");
        }
        self.inner.call(request)
    }
}
