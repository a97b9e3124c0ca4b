//! Admission record storage trait.

use crate::StoreError;
use spotgate_types::{AdmissionRecord, Claim, RecordKey, Timestamp, WalletAddress};

/// Storage for consumed capacity slots.
///
/// Implementations must make [`AdmissionStore::reserve`] atomic: the
/// capacity check, the uniqueness check for wallet claims, ticket
/// allocation, and the insert happen as one step, so concurrent callers can
/// neither overshoot the capacity nor insert the same wallet twice.
pub trait AdmissionStore: Send + Sync {
    /// Number of records currently stored.
    fn count(&self) -> Result<u64, StoreError>;

    /// Whether a record exists for this wallet.
    fn contains_wallet(&self, wallet: &WalletAddress) -> Result<bool, StoreError>;

    /// Insert a record for `claim` if fewer than `capacity` records exist.
    ///
    /// Fails with [`StoreError::CapacityReached`] when full and with
    /// [`StoreError::Duplicate`] when the wallet already holds a record.
    /// Anonymous claims receive a fresh, never reused ticket id.
    fn reserve(
        &self,
        claim: &Claim,
        capacity: u64,
        now: Timestamp,
    ) -> Result<AdmissionRecord, StoreError>;

    /// Delete exactly the record with this key. Returns whether it existed.
    fn release(&self, key: &RecordKey) -> Result<bool, StoreError>;

    /// All records, in key order.
    fn iter_records(&self) -> Result<Vec<AdmissionRecord>, StoreError>;
}
