//! Metricas Prometheus del servidor.
//!
//! Las metricas de la cache las registra `stash-store`; este modulo agrega
//! las HTTP e instala el exporter.

pub mod http;
pub mod setup;

pub use setup::{detached_handle, init_metrics};
