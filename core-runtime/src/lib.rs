//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the decoding crates:
//! - Logging and tracing initialisation
//! - The runtime error type
//!
//! ## Overview
//!
//! Library crates only emit `tracing` events. Binaries and tests that want to
//! see them call [`logging::init_logging`] once at startup.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
