//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::admission::LmdbAdmissionStore;
use crate::LmdbError;

/// Number of named databases in the environment.
const MAX_DBS: u32 = 4;

const ADMISSIONS_DB: &str = "admissions";
const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) admissions_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment in the directory `path`.
    ///
    /// The directory is created if it does not exist. `map_size` is the
    /// maximum size of the memory map in bytes.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and per path;
        // nothing else maps the same files with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let admissions_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(ADMISSIONS_DB))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            admissions_db,
            meta_db,
        })
    }

    /// The raw heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Flush the memory map to disk.
    pub fn force_sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }

    /// Admission record store backed by this environment.
    pub fn admission_store(&self) -> LmdbAdmissionStore {
        LmdbAdmissionStore {
            env: Arc::clone(&self.env),
            admissions_db: self.admissions_db,
            meta_db: self.meta_db,
        }
    }
}
