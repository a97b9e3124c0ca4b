//! Admission records: one record per consumed capacity slot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SpotgateError, Timestamp, WalletAddress};

/// Storage key prefix for identity-bound records.
const WALLET_PREFIX: &[u8] = b"w/";
/// Storage key prefix for anonymous records.
const TICKET_PREFIX: &[u8] = b"t/";

/// What a caller asks the store to reserve a slot for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Claim {
    /// Identity mode: the slot belongs to this wallet, at most once.
    Wallet(WalletAddress),
    /// Anonymous mode: the store allocates a fresh ticket id.
    Anonymous,
}

/// Primary key of an admission record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    /// A validated wallet address (unique).
    Wallet(WalletAddress),
    /// A monotonic ticket id allocated by the store.
    Ticket(u64),
}

impl RecordKey {
    /// Encode the key into the byte layout used by storage backends.
    ///
    /// Wallet keys are `b"w/" ++ address`, ticket keys are
    /// `b"t/" ++ big-endian id` so tickets iterate in allocation order.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RecordKey::Wallet(address) => {
                let mut out = Vec::with_capacity(WALLET_PREFIX.len() + address.as_str().len());
                out.extend_from_slice(WALLET_PREFIX);
                out.extend_from_slice(address.as_str().as_bytes());
                out
            }
            RecordKey::Ticket(id) => {
                let mut out = Vec::with_capacity(TICKET_PREFIX.len() + 8);
                out.extend_from_slice(TICKET_PREFIX);
                out.extend_from_slice(&id.to_be_bytes());
                out
            }
        }
    }

    /// Decode a key produced by [`RecordKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpotgateError> {
        if let Some(rest) = bytes.strip_prefix(WALLET_PREFIX) {
            let address = std::str::from_utf8(rest)
                .map_err(|e| SpotgateError::InvalidRecordKey(e.to_string()))?;
            return Ok(RecordKey::Wallet(WalletAddress::new(address)));
        }
        if let Some(rest) = bytes.strip_prefix(TICKET_PREFIX) {
            let arr: [u8; 8] = rest.try_into().map_err(|_| {
                SpotgateError::InvalidRecordKey(format!("ticket id has {} bytes", rest.len()))
            })?;
            return Ok(RecordKey::Ticket(u64::from_be_bytes(arr)));
        }
        Err(SpotgateError::InvalidRecordKey(
            "unknown key prefix".to_string(),
        ))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Wallet(address) => write!(f, "wallet:{address}"),
            RecordKey::Ticket(id) => write!(f, "ticket:{id}"),
        }
    }
}

/// One consumed slot. Created immediately before invite issuance, deleted
/// only when issuance fails, never updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    pub key: RecordKey,
    pub created_at: Timestamp,
}

impl AdmissionRecord {
    pub fn new(key: RecordKey, created_at: Timestamp) -> Self {
        Self { key, created_at }
    }

    /// The wallet this record is bound to, if any.
    pub fn wallet(&self) -> Option<&WalletAddress> {
        match &self.key {
            RecordKey::Wallet(address) => Some(address),
            RecordKey::Ticket(_) => None,
        }
    }
}
