//! Runtime bridge for blocking callers and detached work.
//!
//! The cache is async at its core. Blocking callers go through
//! [`RuntimeBridge::block_on`], which picks a way to drive the future that
//! is valid for the thread it is called from:
//!
//! - inside a multi-threaded Tokio runtime: `block_in_place`
//! - outside any runtime, with a captured handle: that handle's `block_on`
//! - outside any runtime, without a handle: `futures::executor::block_on`,
//!   unless the store is bound to Tokio, in which case the call is refused
//! - inside a current-thread runtime: refused, since blocking would stall
//!   the only worker

use std::future::Future;

use stash_core::StashError;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

/// Drives cache futures from blocking code and spawns background work.
#[derive(Debug, Clone, Default)]
pub struct RuntimeBridge {
    handle: Option<Handle>,
    requires_runtime: bool,
}

impl RuntimeBridge {
    /// Captures the runtime of the calling context, if any.
    pub fn capture() -> Self {
        Self {
            handle: Handle::try_current().ok(),
            requires_runtime: false,
        }
    }

    /// Uses the given runtime for calls made outside any runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            requires_runtime: false,
        }
    }

    /// Falls back to `handle` when no runtime was captured.
    pub fn or_handle(mut self, handle: Option<Handle>) -> Self {
        if self.handle.is_none() {
            self.handle = handle;
        }
        self
    }

    /// Marks the driven futures as needing a Tokio context. Without a
    /// handle, blocking calls are then refused instead of run on a plain
    /// executor.
    pub fn requiring_runtime(mut self, required: bool) -> Self {
        self.requires_runtime = required;
        self
    }

    /// Returns true if a runtime handle is available outside any runtime.
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Runs `future` to completion on the current thread.
    ///
    /// # Errors
    ///
    /// `StashError::BlockingContext` when called from a current-thread
    /// runtime, or from outside any runtime with no handle while a runtime
    /// is required. The future is dropped without being polled.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, StashError> {
        match Handle::try_current() {
            Ok(current) => match current.runtime_flavor() {
                RuntimeFlavor::MultiThread => {
                    Ok(tokio::task::block_in_place(|| current.block_on(future)))
                },
                flavor => Err(StashError::blocking_context(format!(
                    "cannot block inside a {:?} runtime",
                    flavor
                ))),
            },
            Err(_) => match &self.handle {
                Some(handle) => Ok(handle.block_on(future)),
                None if self.requires_runtime => Err(StashError::blocking_context(
                    "the store needs a Tokio runtime and none is available",
                )),
                None => Ok(futures::executor::block_on(future)),
            },
        }
    }

    /// Spawns `work` detached, on the current runtime or the captured one.
    ///
    /// Returns false when no runtime is available; the work is dropped.
    pub fn spawn<F>(&self, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current().ok().or_else(|| self.handle.clone()) {
            Some(handle) => {
                handle.spawn(work);
                true
            },
            None => {
                warn!("No async runtime available, background work skipped");
                false
            },
        }
    }
}
