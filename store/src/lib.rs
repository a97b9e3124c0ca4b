//! Abstract storage traits for Spotgate.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod admission;
pub mod error;

pub use admission::AdmissionStore;
pub use error::StoreError;
