//! Middleware stack para el servidor HTTP.
//!
//! Este modulo contiene los middleware de Tower que se aplican a todas las requests:
//! - `RequestIdLayer`: Genera/propaga X-Request-Id
//! - `LoggingLayer`: Logging estructurado de requests
//! - `SweepLayer`: Dispara el sweep de entries expiradas cuando corresponde

mod logging;
mod request_id;
mod sweep;

use std::future::Future;
use std::pin::Pin;

use axum::{body::Body, http::Response};

pub use logging::{LoggingLayer, LoggingMiddleware};
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer, RequestIdMiddleware};
pub use sweep::{SweepLayer, SweepMiddleware};

/// Future de los middleware que envuelven la llamada interna.
type ResponseFuture<E> = Pin<Box<dyn Future<Output = Result<Response<Body>, E>> + Send>>;
