//! Async abstraction layer for the Clipify core.
//!
//! All core-* and bridge-* crates depend on this crate instead of reaching
//! into tokio directly, so the runtime surface the auth core relies on is
//! kept in one place:
//!
//! - `task`: task spawning and join handles
//! - `time`: sleep, timeout and durations
//! - `sync`: async locks, channels and cooperative cancellation
//! - `runtime`: blocking entry point for synchronous callers
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep, Duration};
//!
//! # core_async::runtime::block_on(async {
//! let token = CancellationToken::new();
//! let child = token.clone();
//! let handle = core_async::spawn(async move {
//!     tokio::select! {
//!         _ = child.cancelled() => "cancelled",
//!         _ = sleep(Duration::from_secs(60)) => "elapsed",
//!     }
//! });
//! token.cancel();
//! assert_eq!(handle.await.unwrap(), "cancelled");
//! # });
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
