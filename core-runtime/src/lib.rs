//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Clipify core:
//! - Logging and tracing infrastructure
//! - Configuration (bridges plus authentication settings)
//! - Event bus system
//!
//! ## Overview
//!
//! Other crates depend on this one for the logging conventions, the
//! [`CoreConfig`](config::CoreConfig) they are constructed from, and the
//! broadcast channel they publish state changes on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
