//! Nullable store: thread-safe in-memory admission records.

use spotgate_store::{AdmissionStore, StoreError};
use spotgate_types::{AdmissionRecord, Claim, RecordKey, Timestamp, WalletAddress};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

struct Inner {
    records: BTreeMap<RecordKey, AdmissionRecord>,
    next_ticket: u64,
}

/// An in-memory [`AdmissionStore`].
///
/// Reservation holds one lock for the whole check-and-insert, so it is as
/// atomic as the LMDB backend. Thread-safe for tokio's multi-threaded runtime.
pub struct NullStore {
    inner: Mutex<Inner>,
    fail_release: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: BTreeMap::new(),
                next_ticket: 1,
            }),
            fail_release: AtomicBool::new(false),
        }
    }

    /// Pre-populate a wallet record, bypassing capacity.
    pub fn insert_wallet(&self, wallet: &WalletAddress) {
        let key = RecordKey::Wallet(wallet.clone());
        self.inner
            .lock()
            .unwrap()
            .records
            .insert(key.clone(), AdmissionRecord::new(key, Timestamp::EPOCH));
    }

    /// Make every subsequent `release` fail with a backend error.
    pub fn fail_releases(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all stored keys.
    pub fn keys(&self) -> Vec<RecordKey> {
        self.inner.lock().unwrap().records.keys().cloned().collect()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionStore for NullStore {
    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().records.len() as u64)
    }

    fn contains_wallet(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        let key = RecordKey::Wallet(wallet.clone());
        Ok(self.inner.lock().unwrap().records.contains_key(&key))
    }

    fn reserve(
        &self,
        claim: &Claim,
        capacity: u64,
        now: Timestamp,
    ) -> Result<AdmissionRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.len() as u64 >= capacity {
            return Err(StoreError::CapacityReached { capacity });
        }
        let key = match claim {
            Claim::Wallet(address) => {
                let key = RecordKey::Wallet(address.clone());
                if inner.records.contains_key(&key) {
                    return Err(StoreError::Duplicate(address.to_string()));
                }
                key
            }
            Claim::Anonymous => {
                let id = inner.next_ticket;
                inner.next_ticket += 1;
                RecordKey::Ticket(id)
            }
        };
        let record = AdmissionRecord::new(key.clone(), now);
        inner.records.insert(key, record.clone());
        Ok(record)
    }

    fn release(&self, key: &RecordKey) -> Result<bool, StoreError> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("release disabled".to_string()));
        }
        Ok(self.inner.lock().unwrap().records.remove(key).is_some())
    }

    fn iter_records(&self) -> Result<Vec<AdmissionRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().records.values().cloned().collect())
    }
}
