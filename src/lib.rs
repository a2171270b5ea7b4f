//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map onto the individual workspace
//! crates. Host applications (the Clipify desktop shell) can depend on
//! `clipify-core` and enable `desktop-shims` to get the keyring, reqwest and
//! browser-launcher defaults without wiring each crate individually, or
//! `headless` to inject their own bridges.

#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_auth as auth;

#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_runtime as runtime;
