//! SSH public key blobs against OpenSSH's own output.

#![cfg(feature = "soft")]

use base64ct::{Base64, Encoding};
use ssh_keybridge::{
    import,
    provider::{ItemType, KeyClass},
    raw, wire, Algorithm, PublicComponents, RsaPublicComponents,
    SoftProvider,
};

const RSA_PUB: &str = include_str!("examples/rsa2048.pub");
const DSA_PUB: &str = include_str!("examples/dsa1024.pub");
const RSA_PEM: &[u8] = include_bytes!("examples/rsa2048.pem");
const RSA_PUB_PEM: &[u8] = include_bytes!("examples/rsa2048-pub.pem");

/// Method name and decoded blob of an `authorized_keys` line.
fn openssh_blob(line: &str) -> (String, Vec<u8>) {
    let mut fields = line.split_whitespace();
    let method = fields.next().unwrap().to_owned();
    let blob = Base64::decode_vec(fields.next().unwrap()).unwrap();
    (method, blob)
}

fn fixture(name: &str) -> String {
    format!("{}/tests/examples/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn rsa_blob_matches_openssh() {
    let _ = pretty_env_logger::try_init();
    let provider = SoftProvider::new();
    let (method, expected) = openssh_blob(RSA_PUB);

    for (name, passphrase) in [
        ("rsa2048.pem", None),
        ("rsa2048.der", None),
        ("rsa2048.p8", None),
        ("rsa2048-enc.pem", Some("hunter2")),
        ("rsa2048-enc.p8", Some("hunter2")),
    ] {
        let public = wire::public_key_from_path(&provider, fixture(name), passphrase).unwrap();
        assert_eq!(public.method, method, "{}", name);
        assert_eq!(public.blob, expected, "{}", name);
    }

    let public = wire::public_key_from_memory(&provider, RSA_PEM, None).unwrap();
    assert_eq!(public.blob, expected);
}

#[test]
fn dsa_blob_matches_openssh() {
    let provider = SoftProvider::new();
    let (method, expected) = openssh_blob(DSA_PUB);

    for (name, passphrase) in [
        ("dsa1024.pem", None),
        ("dsa1024.der", None),
        ("dsa1024-pkcs8.pem", None),
        ("dsa1024-enc.pem", Some("hunter2")),
    ] {
        let public = wire::public_key_from_path(&provider, fixture(name), passphrase).unwrap();
        assert_eq!(public.method, method, "{}", name);
        assert_eq!(public.blob, expected, "{}", name);
    }
}

#[test]
fn public_key_input_is_encoded_as_is() {
    let provider = SoftProvider::new();
    let (_, expected) = openssh_blob(RSA_PUB);

    let key = import::import_key(&provider, RSA_PUB_PEM, ItemType::Public, None, None).unwrap();
    assert_eq!(key.header().class, KeyClass::Public);
    assert_eq!(wire::public_key_blob(&provider, &key).unwrap().blob, expected);
}

#[test]
fn decoded_blob_rebuilds_the_key() {
    let provider = SoftProvider::new();

    for line in [RSA_PUB, DSA_PUB] {
        let (_, expected) = openssh_blob(line);
        let components = wire::decode_public_key(&expected).unwrap();

        let key = import::public_from_components(&provider, &components).unwrap();
        assert_eq!(key.header().class, KeyClass::Public);
        assert_eq!(raw::public_components(&provider, &key).unwrap(), components);
        assert_eq!(wire::public_key_blob(&provider, &key).unwrap().blob, expected);
    }
}

#[test]
fn rsa_exponent_comes_first() {
    let (_, blob) = openssh_blob(RSA_PUB);
    match wire::decode_public_key(&blob).unwrap() {
        PublicComponents::Rsa(RsaPublicComponents { e, n }) => {
            assert_eq!(e, [0x01, 0x00, 0x01]);
            assert_eq!(n.len(), 256);
        }
        other => panic!("unexpected {:?}", other.algorithm()),
    }
    assert_eq!(&blob[4..11], Algorithm::Rsa.ssh_name().as_bytes());
}
