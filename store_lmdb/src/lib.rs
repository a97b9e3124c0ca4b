//! LMDB storage backend for Spotgate.
//!
//! Implements the storage traits from `spotgate-store` using the `heed` LMDB
//! bindings. All databases live in a single environment under the data
//! directory.

pub mod admission;
pub mod environment;
pub mod error;

pub use admission::LmdbAdmissionStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
