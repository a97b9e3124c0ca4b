#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spotgate_crypto::{parse_address, verify_wallet_proof, SignatureEncoding};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    address: &'a str,
    message: &'a str,
    signature: &'a str,
    base58: bool,
}

fuzz_target!(|input: Input<'_>| {
    // Address and signature parsing must never panic, and a proof can only
    // succeed for an address that parses on its own.
    let encoding = if input.base58 {
        SignatureEncoding::Base58
    } else {
        SignatureEncoding::Base64
    };
    let result = verify_wallet_proof(input.address, input.message, input.signature, encoding);
    if let Ok(true) = result {
        assert!(parse_address(input.address).is_ok());
    }
});
