//! LMDB implementation of AdmissionStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use spotgate_store::{AdmissionStore, StoreError};
use spotgate_types::{AdmissionRecord, Claim, RecordKey, Timestamp, WalletAddress};

use crate::LmdbError;

const NEXT_TICKET_KEY: &[u8] = b"next_ticket";

/// First ticket id handed out by a fresh database.
const FIRST_TICKET: u64 = 1;

pub struct LmdbAdmissionStore {
    pub(crate) env: Arc<Env>,
    pub(crate) admissions_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbAdmissionStore {
    fn read_next_ticket(&self, txn: &heed::RoTxn) -> Result<u64, LmdbError> {
        match self.meta_db.get(txn, NEXT_TICKET_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("next_ticket has unexpected byte length".to_string())
                })?;
                Ok(u64::from_le_bytes(arr))
            }
            None => Ok(FIRST_TICKET),
        }
    }
}

impl AdmissionStore for LmdbAdmissionStore {
    fn count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let len = self.admissions_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(len)
    }

    fn contains_wallet(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        let key = RecordKey::Wallet(wallet.clone()).to_bytes();
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .admissions_db
            .get(&rtxn, key.as_slice())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn reserve(
        &self,
        claim: &Claim,
        capacity: u64,
        now: Timestamp,
    ) -> Result<AdmissionRecord, StoreError> {
        // LMDB serialises writers, so everything inside this transaction is
        // atomic with respect to other reservations.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let used = self.admissions_db.len(&wtxn).map_err(LmdbError::from)?;
        if used >= capacity {
            return Err(StoreError::CapacityReached { capacity });
        }

        let key = match claim {
            Claim::Wallet(address) => {
                let key = RecordKey::Wallet(address.clone());
                let exists = self
                    .admissions_db
                    .get(&wtxn, key.to_bytes().as_slice())
                    .map_err(LmdbError::from)?
                    .is_some();
                if exists {
                    return Err(StoreError::Duplicate(address.to_string()));
                }
                key
            }
            Claim::Anonymous => {
                let id = self.read_next_ticket(&wtxn)?;
                let next = id
                    .checked_add(1)
                    .ok_or_else(|| StoreError::Corruption("ticket id space exhausted".to_string()))?;
                self.meta_db
                    .put(&mut wtxn, NEXT_TICKET_KEY, &next.to_le_bytes())
                    .map_err(LmdbError::from)?;
                RecordKey::Ticket(id)
            }
        };

        let record = AdmissionRecord::new(key, now);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.admissions_db
            .put(&mut wtxn, record.key.to_bytes().as_slice(), bytes.as_slice())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(key = %record.key, used = used + 1, capacity, "reserved admission slot");
        Ok(record)
    }

    fn release(&self, key: &RecordKey) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .admissions_db
            .delete(&mut wtxn, key.to_bytes().as_slice())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn iter_records(&self) -> Result<Vec<AdmissionRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.admissions_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut result = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            let stored_key =
                RecordKey::from_bytes(key).map_err(|e| StoreError::Corruption(e.to_string()))?;
            let record: AdmissionRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if record.key != stored_key {
                return Err(StoreError::Corruption(format!(
                    "record {} stored under a different key",
                    record.key
                )));
            }
            result.push(record);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    const MAP_SIZE: usize = 8 * 1024 * 1024;

    fn temp_store() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).expect("open env");
        (dir, env)
    }

    fn wallet(s: &str) -> WalletAddress {
        WalletAddress::new(s)
    }

    #[test]
    fn reserve_wallet_and_count() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        assert_eq!(store.count().unwrap(), 0);

        let rec = store
            .reserve(&Claim::Wallet(wallet("alice")), 10, Timestamp::new(100))
            .unwrap();
        assert_eq!(rec.key, RecordKey::Wallet(wallet("alice")));
        assert_eq!(rec.created_at, Timestamp::new(100));
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.contains_wallet(&wallet("alice")).unwrap());
        assert!(!store.contains_wallet(&wallet("bob")).unwrap());
    }

    #[test]
    fn duplicate_wallet_rejected() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        store
            .reserve(&Claim::Wallet(wallet("alice")), 10, Timestamp::new(1))
            .unwrap();
        let err = store
            .reserve(&Claim::Wallet(wallet("alice")), 10, Timestamp::new(2))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn capacity_enforced_on_insert() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        store.reserve(&Claim::Anonymous, 2, Timestamp::new(1)).unwrap();
        store.reserve(&Claim::Anonymous, 2, Timestamp::new(1)).unwrap();
        let err = store
            .reserve(&Claim::Wallet(wallet("carol")), 2, Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::CapacityReached { capacity: 2 }));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn tickets_are_monotonic_and_never_reused() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        let a = store.reserve(&Claim::Anonymous, 10, Timestamp::new(1)).unwrap();
        let b = store.reserve(&Claim::Anonymous, 10, Timestamp::new(1)).unwrap();
        assert_eq!(a.key, RecordKey::Ticket(1));
        assert_eq!(b.key, RecordKey::Ticket(2));

        assert!(store.release(&b.key).unwrap());
        let c = store.reserve(&Claim::Anonymous, 10, Timestamp::new(1)).unwrap();
        assert_eq!(c.key, RecordKey::Ticket(3));
    }

    #[test]
    fn release_deletes_only_the_given_ticket() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        let first = store.reserve(&Claim::Anonymous, 10, Timestamp::new(1)).unwrap();
        let second = store.reserve(&Claim::Anonymous, 10, Timestamp::new(2)).unwrap();

        assert!(store.release(&first.key).unwrap());
        let remaining = store.iter_records().unwrap();
        assert_eq!(remaining, vec![second]);
        assert!(!store.release(&first.key).unwrap());
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
            let store = env.admission_store();
            store
                .reserve(&Claim::Wallet(wallet("alice")), 5, Timestamp::new(7))
                .unwrap();
            store.reserve(&Claim::Anonymous, 5, Timestamp::new(8)).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let store = env.admission_store();
        assert_eq!(store.count().unwrap(), 2);
        assert!(store.contains_wallet(&wallet("alice")).unwrap());
        let next = store.reserve(&Claim::Anonymous, 5, Timestamp::new(9)).unwrap();
        assert_eq!(next.key, RecordKey::Ticket(2));
    }

    #[test]
    fn concurrent_reservations_never_overshoot() {
        let (_dir, env) = temp_store();
        let store = Arc::new(env.admission_store());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let claim = if i % 2 == 0 {
                        Claim::Anonymous
                    } else {
                        Claim::Wallet(WalletAddress::new(format!("wallet-{i}")))
                    };
                    store.reserve(&claim, 5, Timestamp::new(1)).is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 5);
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn unknown_key_layout_reported_as_corruption() {
        let (_dir, env) = temp_store();
        let store = env.admission_store();
        store
            .reserve(&Claim::Anonymous, 5, Timestamp::new(1))
            .unwrap();

        let mut wtxn = env.env().write_txn().unwrap();
        env.admissions_db
            .put(&mut wtxn, b"x/stray", b"not a record")
            .unwrap();
        wtxn.commit().unwrap();

        match store.iter_records() {
            Err(StoreError::Corruption(msg)) => assert!(msg.contains("invalid record key")),
            other => panic!("expected corruption, got {other:?}"),
        }
    }
}
