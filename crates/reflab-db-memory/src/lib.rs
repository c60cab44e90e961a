//! In-memory document store backend.
//!
//! Backs the Reflab server in development and in every test. Concurrency is
//! handled by `dashmap`; each operation touches exactly one document, which
//! matches the single-document atomicity contract of [`reflab_storage`].

mod storage;

pub use storage::MemoryDocumentStore;
