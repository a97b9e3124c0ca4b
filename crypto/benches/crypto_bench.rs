use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spotgate_crypto::SignatureEncoding;

const CHALLENGE: &str = "Sign this message to prove you own this wallet";

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = spotgate_crypto::keypair_from_seed(&[42u8; 32]);
    let sig = spotgate_crypto::sign_message(CHALLENGE.as_bytes(), &kp.private);

    c.bench_function("ed25519_verify_challenge", |b| {
        b.iter(|| spotgate_crypto::verify_signature(black_box(CHALLENGE.as_bytes()), &sig, &kp.public))
    });
}

fn wallet_proof_bench(c: &mut Criterion) {
    let kp = spotgate_crypto::keypair_from_seed(&[42u8; 32]);
    let addr = spotgate_crypto::derive_address(&kp.public);
    let sig = spotgate_crypto::sign_message(CHALLENGE.as_bytes(), &kp.private);
    let b58 = spotgate_crypto::encode_signature(&sig, SignatureEncoding::Base58);
    let b64 = spotgate_crypto::encode_signature(&sig, SignatureEncoding::Base64);

    c.bench_function("wallet_proof_base58", |b| {
        b.iter(|| {
            spotgate_crypto::verify_wallet_proof(
                black_box(addr.as_str()),
                CHALLENGE,
                black_box(&b58),
                SignatureEncoding::Base58,
            )
        })
    });

    c.bench_function("wallet_proof_base64", |b| {
        b.iter(|| {
            spotgate_crypto::verify_wallet_proof(
                black_box(addr.as_str()),
                CHALLENGE,
                black_box(&b64),
                SignatureEncoding::Base64,
            )
        })
    });
}

criterion_group!(benches, ed25519_verify_bench, wallet_proof_bench);
criterion_main!(benches);
