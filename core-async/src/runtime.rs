//! Runtime helpers.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a throwaway current-thread
/// runtime.
///
/// Used by synchronous callers (logging layers, host shims) that need to
/// drive a bridge future when no runtime is active on the current thread.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(_) => futures::executor::block_on(future),
    }
}
