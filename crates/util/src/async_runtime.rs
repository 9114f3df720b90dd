//! Running hook futures from synchronous hosts.
//!
//! The host platform calls hooks as plain functions. This module drives an
//! async hook to completion on the caller's thread, reusing a multi-threaded
//! Tokio runtime when one is already running.

use std::future::Future;

use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;

/// Failure to obtain a runtime for a blocking call.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("could not build a Tokio runtime: {0}")]
    Build(#[from] std::io::Error),

    #[error("cannot block inside a current-thread Tokio runtime; call the async hook instead")]
    CurrentThread,
}

/// Drive `future` to completion from synchronous code.
///
/// - Inside a multi-threaded runtime the worker is handed off with
///   `block_in_place` so other tasks keep running.
/// - Inside a current-thread runtime blocking would deadlock, so an error is
///   returned.
/// - Outside any runtime a temporary current-thread runtime is built.
pub fn run_blocking<F, T>(future: F) -> Result<T, RuntimeError>
where
    F: Future<Output = T>,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => Ok(task::block_in_place(|| handle.block_on(future))),
        Ok(_) => Err(RuntimeError::CurrentThread),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            Ok(runtime.block_on(future))
        }
    }
}
