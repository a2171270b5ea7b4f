//! Task spawning.
//!
//! Tasks spawned here run on the ambient Tokio runtime. Background loops in
//! the auth core (deep-link listener, refresh scheduler) keep the returned
//! [`JoinHandle`] so they can be aborted when their owner shuts down.

pub use tokio::task::{yield_now, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current runtime.
///
/// # Panics
///
/// Panics when called outside of a Tokio runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}
