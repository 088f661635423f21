use secrecy::SecretString;
use sigil_signature::{sign, Body, SignedRequest, Verifier, VerifierConfig};

const T: i64 = 1_700_000_000_000;

fn make_body(size: usize) -> Vec<u8> {
    (0..size).map(|i| b'a' + (i % 26) as u8).collect()
}

#[divan::bench(args = [64, 4096, 65536])]
fn bench_verify(bencher: divan::Bencher, size: usize) {
    let verifier = Verifier::new(VerifierConfig {
        secret: Some(SecretString::from("bench-secret")),
        ..VerifierConfig::default()
    });
    let body = make_body(size);
    let signature = sign(b"bench-secret", T, &Body::Raw(&body)).unwrap();
    let timestamp = T.to_string();
    let request = SignedRequest {
        signature: Some(signature.as_bytes()),
        timestamp: Some(timestamp.as_bytes()),
        body: Body::Raw(&body),
    };
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| verifier.verify(divan::black_box(&request), T));
}

fn main() {
    divan::main();
}
