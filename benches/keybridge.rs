#![feature(test)]

extern crate test;

use sha1::{Digest, Sha1};
use ssh_keybridge::{import, sign, wire, SoftKey, SoftProvider};
use test::Bencher;

const RSA_PEM: &[u8] = include_bytes!("../tests/examples/rsa2048.pem");
const RSA_DER: &[u8] = include_bytes!("../tests/examples/rsa2048.der");
const DSA_PEM: &[u8] = include_bytes!("../tests/examples/dsa1024.pem");

const MESSAGE: &[u8] = b"session identifier";

fn key(data: &[u8]) -> SoftKey {
    import::private_key_from_memory(&SoftProvider::new(), data, None).unwrap()
}

#[bench]
fn bench_import_pem(b: &mut Bencher) {
    let provider = SoftProvider::new();
    b.iter(|| test::black_box(import::private_key_from_memory(&provider, RSA_PEM, None).unwrap()));
}

#[bench]
fn bench_public_key_blob_raw(b: &mut Bencher) {
    let provider = SoftProvider::new();
    let key = key(RSA_DER);
    b.iter(|| test::black_box(wire::public_key_blob(&provider, &key).unwrap()));
}

#[bench]
fn bench_public_key_blob_exported(b: &mut Bencher) {
    let provider = SoftProvider::new();
    let key = key(RSA_PEM);
    b.iter(|| test::black_box(wire::public_key_blob(&provider, &key).unwrap()));
}

#[bench]
fn bench_rsa_sha1_sign(b: &mut Bencher) {
    let provider = SoftProvider::new();
    let key = key(RSA_PEM);
    let digest = Sha1::digest(MESSAGE);
    b.iter(|| test::black_box(sign::rsa_sha1_sign(&provider, &key, &digest).unwrap()));
}

#[bench]
fn bench_rsa_sha1_verify(b: &mut Bencher) {
    let provider = SoftProvider::new();
    let key = key(RSA_PEM);
    let signature = sign::rsa_sha1_sign(&provider, &key, &Sha1::digest(MESSAGE)).unwrap();
    b.iter(|| test::black_box(sign::rsa_sha1_verify(&provider, &key, &signature, MESSAGE)));
}

#[bench]
fn bench_dsa_sha1_sign(b: &mut Bencher) {
    let provider = SoftProvider::new();
    let key = key(DSA_PEM);
    let digest = Sha1::digest(MESSAGE);
    b.iter(|| test::black_box(sign::dsa_sha1_sign(&provider, &key, &digest).unwrap()));
}
