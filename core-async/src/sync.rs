//! Synchronization primitives.
//!
//! Re-exports the async-aware `tokio::sync` primitives together with
//! `tokio_util`'s [`CancellationToken`], which background tasks use to stop
//! cooperatively instead of being torn down mid-operation.
//!
//! ```rust
//! use core_async::sync::{watch, Mutex};
//!
//! # core_async::runtime::block_on(async {
//! let lock = Mutex::new(0);
//! *lock.lock().await += 1;
//!
//! let (tx, rx) = watch::channel(false);
//! tx.send_replace(true);
//! assert!(*rx.borrow());
//! # });
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};
pub use tokio_util::sync::CancellationToken;
