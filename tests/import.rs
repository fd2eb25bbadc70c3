//! Key import through the software provider.

#![cfg(feature = "soft")]

use std::path::Path;

use ssh_keybridge::{
    import,
    provider::{BlobType, ItemType, KeyClass},
    raw, wire, Algorithm, Error, SoftKey, SoftProvider,
};

const RSA_PEM: &[u8] = include_bytes!("examples/rsa2048.pem");
const RSA_DER: &[u8] = include_bytes!("examples/rsa2048.der");
const RSA_P8: &[u8] = include_bytes!("examples/rsa2048.p8");
const RSA_PKCS8_PEM: &[u8] = include_bytes!("examples/rsa2048-pkcs8.pem");
const RSA_ENC_PKCS8_PEM: &[u8] = include_bytes!("examples/rsa2048-enc-pkcs8.pem");
const RSA_ENC_PEM: &[u8] = include_bytes!("examples/rsa2048-enc.pem");
const RSA_PUB_PEM: &[u8] = include_bytes!("examples/rsa2048-pub.pem");
const DSA_PEM: &[u8] = include_bytes!("examples/dsa1024.pem");
const DSA_DER: &[u8] = include_bytes!("examples/dsa1024.der");
const DSA_PKCS8_PEM: &[u8] = include_bytes!("examples/dsa1024-pkcs8.pem");
const DSA_ENC_PEM: &[u8] = include_bytes!("examples/dsa1024-enc.pem");
const TWO_KEYS: &[u8] = include_bytes!("examples/two-keys.pem");
const CERT: &[u8] = include_bytes!("examples/cert.pem");

const PASSPHRASE: &str = "hunter2";

fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

fn fixture(name: &str) -> String {
    format!("{}/tests/examples/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn blob(key: &SoftKey) -> Vec<u8> {
    wire::public_key_blob(&SoftProvider::new(), key).unwrap().blob
}

#[test]
fn every_private_encoding_yields_the_same_key() {
    init_logging();
    let provider = SoftProvider::new();
    let reference = import::private_key_from_memory(&provider, RSA_PEM, None).unwrap();
    assert_eq!(reference.header().algorithm, Algorithm::Rsa);
    assert_eq!(reference.header().class, KeyClass::Private);

    let unencrypted = [RSA_DER, RSA_P8, RSA_PKCS8_PEM];
    for data in unencrypted {
        let key = import::private_key_from_memory(&provider, data, None).unwrap();
        assert_eq!(blob(&key), blob(&reference));
    }

    for data in [RSA_ENC_PKCS8_PEM, RSA_ENC_PEM] {
        let key = import::private_key_from_memory(&provider, data, Some(PASSPHRASE)).unwrap();
        assert_eq!(blob(&key), blob(&reference));
    }
}

#[test]
fn dsa_encodings() {
    init_logging();
    let provider = SoftProvider::new();
    let reference = import::private_key_from_memory(&provider, DSA_PEM, None).unwrap();
    assert_eq!(reference.header().algorithm, Algorithm::Dsa);

    for data in [DSA_DER, DSA_PKCS8_PEM] {
        let key = import::private_key_from_memory(&provider, data, None).unwrap();
        assert_eq!(blob(&key), blob(&reference));
    }

    let key = import::private_key_from_memory(&provider, DSA_ENC_PEM, Some(PASSPHRASE)).unwrap();
    assert_eq!(blob(&key), blob(&reference));
}

#[test]
fn raw_der_is_read_in_place() {
    let provider = SoftProvider::new();
    let key = import::private_key_from_memory(&provider, RSA_DER, None).unwrap();
    assert_eq!(key.blob_type(), BlobType::Raw);

    let pem = import::private_key_from_memory(&provider, RSA_PEM, None).unwrap();
    assert_eq!(pem.blob_type(), BlobType::Reference);

    let format = raw::raw_format(&provider, &pem).unwrap();
    let exported = raw::with_raw_key(&provider, &pem, format, |view| view.data().to_vec());
    assert_eq!(exported.as_deref(), Some(RSA_DER));
}

#[test]
fn unencrypted_p8_file_is_rewrapped_as_pem() {
    init_logging();
    let provider = SoftProvider::new();

    let key = import::private_key_from_path(&provider, fixture("rsa2048.p8"), None).unwrap();
    let reference = import::private_key_from_memory(&provider, RSA_PEM, None).unwrap();
    assert_eq!(blob(&key), blob(&reference));

    // a passphrase disables the fallback
    assert!(matches!(
        import::private_key_from_path(&provider, fixture("rsa2048.p8"), Some(PASSPHRASE)),
        Err(Error::Import)
    ));
}

#[test]
fn encrypted_p8_file_needs_its_passphrase() {
    let provider = SoftProvider::new();
    let path = fixture("rsa2048-enc.p8");

    assert!(import::private_key_from_path(&provider, &path, Some(PASSPHRASE)).is_ok());
    assert!(matches!(
        import::private_key_from_path(&provider, &path, None),
        Err(Error::Import)
    ));
    assert!(matches!(
        import::private_key_from_path(&provider, &path, Some("hunter3")),
        Err(Error::Import)
    ));
}

#[test]
fn passphrase_mismatches_fail() {
    let provider = SoftProvider::new();

    // unencrypted input with a passphrase
    assert!(matches!(
        import::private_key_from_memory(&provider, RSA_PEM, Some(PASSPHRASE)),
        Err(Error::Import)
    ));
    // encrypted input without one
    assert!(matches!(
        import::private_key_from_memory(&provider, RSA_ENC_PKCS8_PEM, None),
        Err(Error::Import)
    ));
    assert!(matches!(
        import::private_key_from_memory(&provider, DSA_ENC_PEM, None),
        Err(Error::Import)
    ));
    assert!(matches!(
        import::private_key_from_memory(&provider, RSA_ENC_PKCS8_PEM, Some("hunter3")),
        Err(Error::Import)
    ));
}

#[test]
fn result_must_be_a_single_key() {
    let provider = SoftProvider::new();

    assert!(matches!(
        import::private_key_from_memory(&provider, TWO_KEYS, None),
        Err(Error::AmbiguousOrWrongType)
    ));
    assert!(matches!(
        import::private_key_from_memory(&provider, CERT, None),
        Err(Error::AmbiguousOrWrongType)
    ));
}

#[test]
fn garbage_and_missing_files() {
    let provider = SoftProvider::new();

    assert!(matches!(
        import::private_key_from_memory(&provider, b"not a key", None),
        Err(Error::Import)
    ));
    assert!(matches!(
        import::import_key(&provider, &RSA_DER[..100], ItemType::Private, None, None),
        Err(Error::Import)
    ));
    assert!(matches!(
        import::private_key_from_path(&provider, fixture("missing.pem"), None),
        Err(Error::Io(_))
    ));
}

#[test]
fn item_type_selects_the_key_class() {
    let provider = SoftProvider::new();

    // private key asked for as public, in every encoding
    for data in [RSA_PEM, RSA_DER, RSA_PKCS8_PEM] {
        assert!(matches!(
            import::import_key(&provider, data, ItemType::Public, None, None),
            Err(Error::Import)
        ));
    }
    // public key asked for as private
    assert!(matches!(
        import::private_key_from_memory(&provider, RSA_PUB_PEM, None),
        Err(Error::Import)
    ));

    let public = import::import_key(&provider, RSA_PUB_PEM, ItemType::Public, None, None).unwrap();
    assert_eq!(public.header().class, KeyClass::Public);
    let private = import::private_key_from_memory(&provider, RSA_PEM, None).unwrap();
    assert_eq!(blob(&public), blob(&private));

    let path = fixture("rsa2048-enc.p8");
    assert!(matches!(
        import::import_key(
            &provider,
            &std::fs::read(&path).unwrap(),
            ItemType::Public,
            Some(Path::new(&path)),
            Some(PASSPHRASE)
        ),
        Err(Error::Import)
    ));
}
