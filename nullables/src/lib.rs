//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies are abstracted behind traits; this crate provides
//! test-friendly implementations that never touch the filesystem and can be
//! told to fail on demand.

pub mod store;

pub use store::NullChainStore;
