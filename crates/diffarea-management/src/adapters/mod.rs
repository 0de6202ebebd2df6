//! Adapter implementations of the provider port.
//!
//! Production hosts wrap the native storage-area provider; the in-memory
//! adapter here exists so every invariant is testable without real
//! volumes.

pub mod memory_provider;

pub use memory_provider::InMemoryStorageAreaProvider;
