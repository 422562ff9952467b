//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-decoding`, `core-runtime`). Host applications can
//! depend on `mp3-stream-workspace` and enable the documented features without
//! needing to wire each crate individually.

#[cfg(feature = "decoding")]
pub use core_decoding as decoding;

#[cfg(feature = "logging")]
pub use core_runtime as runtime;
