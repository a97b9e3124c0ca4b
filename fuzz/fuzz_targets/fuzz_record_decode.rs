#![no_main]

use libfuzzer_sys::fuzz_target;
use spotgate_types::{AdmissionRecord, RecordKey};

fuzz_target!(|data: &[u8]| {
    // Stored keys and values come back from disk; decoding must not panic.
    if let Ok(key) = RecordKey::from_bytes(data) {
        if let RecordKey::Ticket(_) = key {
            assert_eq!(key.to_bytes(), data);
        }
    }
    let _ = bincode::deserialize::<AdmissionRecord>(data);
});
