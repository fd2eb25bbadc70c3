//! Software provider backed by the RustCrypto `rsa` and `dsa` crates.
//!
//! Keys imported from their provider-native raw DER (PKCS#1 for RSA, the
//! OpenSSL `DSAPrivateKey` layout and X.509 `SubjectPublicKeyInfo` for DSA)
//! keep those bytes as a [`BlobType::Raw`] blob. Everything else (PEM,
//! PKCS#8, encrypted inputs) becomes a [`BlobType::Reference`] key that has
//! to be wrapped before its raw form can be read.
//!
//! A source path whose extension starts with `p8` selects the PKCS#8
//! importer, which only understands *encrypted* PKCS#8 DER.

mod pem;

use core::fmt;
use std::sync::Arc;

use base64ct::{Base64, Encoding};
use digest::Digest;
use num_bigint::BigUint;
use pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, EncryptedPrivateKeyInfo};
use rand_core::OsRng;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use signature::{hazmat::PrehashVerifier, SignatureEncoding};
use zeroize::Zeroizing;

use super::{
    Algorithm, BlobType, DigestAlgorithm, ImportParams, ImportedItem, ItemType, KeyBlob, KeyClass,
    KeyHeader, Provider, RawFormat, RawKey,
};
use crate::asn1;

/// Line width of [`Provider::encode_base64`] output.
const BASE64_LINE_WIDTH: usize = 64;

/// Errors raised by [`SoftProvider`].
#[derive(Debug)]
#[non_exhaustive]
pub enum SoftError {
    /// Structure rejected by this crate's ASN.1 codec.
    Asn1(crate::Error),
    /// DER error.
    Der(der::Error),
    /// PKCS#1 error.
    Pkcs1(pkcs1::Error),
    /// PKCS#8 error.
    Pkcs8(pkcs8::Error),
    /// SubjectPublicKeyInfo error.
    Spki(pkcs8::spki::Error),
    /// RSA operation failed.
    Rsa(rsa::Error),
    /// DSA operation failed.
    Signature(signature::Error),
    /// RFC 7468 PEM error.
    Pem(pem_rfc7468::Error),
    /// Base64 error.
    Base64(base64ct::Error),
    /// PEM framing or legacy encryption headers are malformed.
    MalformedPem,
    /// PEM block label is not supported.
    UnsupportedLabel(String),
    /// Legacy PEM cipher is not supported.
    UnsupportedCipher(String),
    /// No supported encoding matched the input.
    UnsupportedEncoding,
    /// Legacy PEM decryption failed, usually because of a wrong passphrase.
    Decrypt,
    /// Encrypted input but no passphrase.
    PassphraseRequired,
    /// A passphrase was given for unencrypted input.
    UnexpectedPassphrase,
    /// The key was imported as non-extractable.
    NotExtractable,
    /// The operation needs a private key.
    PrivateKeyRequired,
    /// Digest length does not match the digest algorithm.
    DigestLength,
    /// The key cannot be exported in this raw format.
    Format(RawFormat),
    /// The input holds a key of the other class than the one requested.
    UnexpectedClass(KeyClass),
}

impl fmt::Display for SoftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftError::Asn1(err) => write!(f, "{}", err),
            SoftError::Der(err) => write!(f, "DER error: {}", err),
            SoftError::Pkcs1(err) => write!(f, "PKCS#1 error: {}", err),
            SoftError::Pkcs8(err) => write!(f, "PKCS#8 error: {}", err),
            SoftError::Spki(err) => write!(f, "SPKI error: {}", err),
            SoftError::Rsa(err) => write!(f, "RSA error: {}", err),
            SoftError::Signature(err) => write!(f, "DSA error: {}", err),
            SoftError::Pem(err) => write!(f, "PEM error: {}", err),
            SoftError::Base64(err) => write!(f, "Base64 error: {}", err),
            SoftError::MalformedPem => write!(f, "malformed PEM"),
            SoftError::UnsupportedLabel(label) => write!(f, "unsupported PEM label `{}`", label),
            SoftError::UnsupportedCipher(name) => write!(f, "unsupported PEM cipher `{}`", name),
            SoftError::UnsupportedEncoding => write!(f, "unrecognised key encoding"),
            SoftError::Decrypt => write!(f, "decryption failed"),
            SoftError::PassphraseRequired => write!(f, "passphrase required"),
            SoftError::UnexpectedPassphrase => write!(f, "passphrase given for unencrypted key"),
            SoftError::NotExtractable => write!(f, "key is not extractable"),
            SoftError::PrivateKeyRequired => write!(f, "operation requires a private key"),
            SoftError::DigestLength => write!(f, "digest has the wrong length"),
            SoftError::Format(format) => write!(f, "cannot export key as {:?}", format),
            SoftError::UnexpectedClass(class) => {
                write!(f, "found a {:?} key where the other class was requested", class)
            }
        }
    }
}

impl std::error::Error for SoftError {}

macro_rules! impl_from {
    ($($variant:ident($err:ty)),+ $(,)?) => {
        $(
            impl From<$err> for SoftError {
                fn from(err: $err) -> SoftError {
                    SoftError::$variant(err)
                }
            }
        )+
    };
}

impl_from!(
    Asn1(crate::Error),
    Der(der::Error),
    Pkcs1(pkcs1::Error),
    Pkcs8(pkcs8::Error),
    Spki(pkcs8::spki::Error),
    Rsa(rsa::Error),
    Signature(signature::Error),
    Pem(pem_rfc7468::Error),
    Base64(base64ct::Error),
);

enum Material {
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
    DsaPrivate(dsa::SigningKey),
    DsaPublic(dsa::VerifyingKey),
}

impl Material {
    fn algorithm(&self) -> Algorithm {
        match self {
            Material::RsaPrivate(_) | Material::RsaPublic(_) => Algorithm::Rsa,
            Material::DsaPrivate(_) | Material::DsaPublic(_) => Algorithm::Dsa,
        }
    }

    fn class(&self) -> KeyClass {
        match self {
            Material::RsaPrivate(_) | Material::DsaPrivate(_) => KeyClass::Private,
            Material::RsaPublic(_) | Material::DsaPublic(_) => KeyClass::Public,
        }
    }
}

struct KeyInner {
    header: KeyHeader,
    material: Material,
    raw: Option<Zeroizing<Vec<u8>>>,
    extractable: bool,
}

/// Reference-counted key handle issued by [`SoftProvider`].
#[derive(Clone)]
pub struct SoftKey(Arc<KeyInner>);

impl SoftKey {
    fn new(material: Material, raw: Option<(RawFormat, &[u8])>, params: &ImportParams<'_>) -> Self {
        let algorithm = material.algorithm();
        let class = material.class();
        let (format, raw) = match raw {
            Some((format, data)) => (format, Some(Zeroizing::new(data.to_vec()))),
            None => (algorithm.raw_format(class), None),
        };

        SoftKey(Arc::new(KeyInner {
            header: KeyHeader {
                algorithm,
                class,
                format,
            },
            material,
            raw,
            extractable: params.extractable,
        }))
    }

    fn reference(material: Material, params: &ImportParams<'_>) -> Self {
        Self::new(material, None, params)
    }

    /// Key description.
    pub fn header(&self) -> KeyHeader {
        self.0.header
    }

    /// Whether the key is held as a raw blob or as a reference.
    pub fn blob_type(&self) -> BlobType {
        match self.0.raw {
            Some(_) => BlobType::Raw,
            None => BlobType::Reference,
        }
    }

    /// Number of live handles to this key.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Debug for SoftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftKey")
            .field("header", &self.0.header)
            .field("blob_type", &self.blob_type())
            .finish_non_exhaustive()
    }
}

/// Software [`Provider`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftProvider;

impl SoftProvider {
    /// Create a provider.
    pub fn new() -> Self {
        SoftProvider
    }
}

impl Provider for SoftProvider {
    type Key = SoftKey;
    type Error = SoftError;

    fn import_items(
        &self,
        data: &[u8],
        params: &ImportParams<'_>,
    ) -> Result<Vec<ImportedItem<SoftKey>>, SoftError> {
        let extension = params.extension();
        match extension.as_deref() {
            Some(ext) if ext.starts_with("p8") => {
                log::trace!("`.{}` source, using the PKCS#8 importer", ext);
                let material = encrypted_pkcs8_private(data, params.passphrase)?;
                let material = expect_class(material, params)?;
                Ok(vec![ImportedItem::Key(SoftKey::reference(material, params))])
            }
            Some("pem") => import_pem(data, params),
            _ if pem::is_pem(data) => import_pem(data, params),
            _ => {
                let key = match params.item_type {
                    ItemType::Private => import_private_der(data, params)?,
                    ItemType::Public => import_public_der(data, params)?,
                };
                Ok(vec![ImportedItem::Key(key)])
            }
        }
    }

    fn key_blob<'k>(&self, key: &'k SoftKey) -> Result<KeyBlob<'k>, SoftError> {
        let (blob_type, data) = match &key.0.raw {
            Some(raw) => (BlobType::Raw, raw.as_slice()),
            None => (BlobType::Reference, &[][..]),
        };

        Ok(KeyBlob {
            header: key.0.header,
            blob_type,
            data,
        })
    }

    fn wrap_key(&self, key: &SoftKey, format: RawFormat) -> Result<RawKey, SoftError> {
        if key.0.header.class == KeyClass::Private && !key.0.extractable {
            return Err(SoftError::NotExtractable);
        }

        let (format, data) = match (&key.0.material, format) {
            (Material::RsaPrivate(rsa_key), RawFormat::Pkcs1) => {
                let der = EncodeRsaPrivateKey::to_pkcs1_der(rsa_key)?;
                (RawFormat::Pkcs1, Zeroizing::new(der.as_bytes().to_vec()))
            }
            (Material::RsaPublic(rsa_key), RawFormat::Pkcs1) => {
                let der = EncodeRsaPublicKey::to_pkcs1_der(rsa_key)?;
                (RawFormat::Pkcs1, Zeroizing::new(der.as_bytes().to_vec()))
            }
            (Material::DsaPrivate(dsa_key), RawFormat::OpenSsl) => {
                (RawFormat::OpenSsl, openssl_dsa_der(dsa_key)?)
            }
            (Material::DsaPublic(dsa_key), RawFormat::OpenSsl | RawFormat::X509) => {
                let der = dsa_key.to_public_key_der()?;
                (RawFormat::X509, Zeroizing::new(der.as_bytes().to_vec()))
            }
            (_, format) => return Err(SoftError::Format(format)),
        };

        Ok(RawKey {
            header: KeyHeader {
                format,
                ..key.0.header
            },
            data,
        })
    }

    fn sign_digest(
        &self,
        key: &SoftKey,
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, SoftError> {
        if digest.len() != algorithm.output_size() {
            return Err(SoftError::DigestLength);
        }

        match &key.0.material {
            Material::RsaPrivate(rsa_key) => {
                let padding = match algorithm {
                    DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
                };
                Ok(rsa_key.sign_with_rng(&mut OsRng, padding, digest)?)
            }
            Material::DsaPrivate(dsa_key) => {
                let signature = match algorithm {
                    DigestAlgorithm::Sha1 => dsa_key.sign_prehashed_rfc6979::<Sha1>(digest)?,
                };
                Ok(signature.to_vec())
            }
            Material::RsaPublic(_) | Material::DsaPublic(_) => Err(SoftError::PrivateKeyRequired),
        }
    }

    fn verify_message(
        &self,
        key: &SoftKey,
        algorithm: DigestAlgorithm,
        signature: &[u8],
        message: &[u8],
    ) -> Result<bool, SoftError> {
        let digest = match algorithm {
            DigestAlgorithm::Sha1 => Sha1::digest(message),
        };

        match &key.0.material {
            Material::RsaPrivate(rsa_key) => rsa_verify(&rsa_key.to_public_key(), &digest, signature),
            Material::RsaPublic(rsa_key) => rsa_verify(rsa_key, &digest, signature),
            Material::DsaPrivate(dsa_key) => dsa_verify(dsa_key.verifying_key(), &digest, signature),
            Material::DsaPublic(dsa_key) => dsa_verify(dsa_key, &digest, signature),
        }
    }

    fn encode_base64(&self, data: &[u8]) -> Result<String, SoftError> {
        let encoded = Base64::encode_string(data);
        let lines: Vec<&str> = (0..encoded.len())
            .step_by(BASE64_LINE_WIDTH)
            .map(|start| &encoded[start..encoded.len().min(start + BASE64_LINE_WIDTH)])
            .collect();
        Ok(lines.join("\n"))
    }
}

fn rsa_verify(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> Result<bool, SoftError> {
    match key.verify(Pkcs1v15Sign::new::<Sha1>(), digest, signature) {
        Ok(()) => Ok(true),
        Err(rsa::Error::Verification) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn dsa_verify(key: &dsa::VerifyingKey, digest: &[u8], signature: &[u8]) -> Result<bool, SoftError> {
    let signature = dsa::Signature::try_from(signature)?;
    Ok(key.verify_prehash(digest, &signature).is_ok())
}

fn refuse_passphrase(params: &ImportParams<'_>) -> Result<(), SoftError> {
    match params.passphrase {
        Some(_) => Err(SoftError::UnexpectedPassphrase),
        None => Ok(()),
    }
}

fn import_private_der(data: &[u8], params: &ImportParams<'_>) -> Result<SoftKey, SoftError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(data) {
        log::trace!("PKCS#1 RSA private key");
        refuse_passphrase(params)?;
        let raw = Some((RawFormat::Pkcs1, data));
        return Ok(SoftKey::new(Material::RsaPrivate(key), raw, params));
    }

    if let Ok(key) = openssl_dsa_private(data) {
        log::trace!("OpenSSL DSA private key");
        refuse_passphrase(params)?;
        let raw = Some((RawFormat::OpenSsl, data));
        return Ok(SoftKey::new(Material::DsaPrivate(key), raw, params));
    }

    if let Ok(material) = pkcs8_private(data) {
        log::trace!("PKCS#8 private key");
        refuse_passphrase(params)?;
        return Ok(SoftKey::reference(material, params));
    }

    if EncryptedPrivateKeyInfo::try_from(data).is_ok() {
        log::trace!("encrypted PKCS#8 private key");
        let material = encrypted_pkcs8_private(data, params.passphrase)?;
        return Ok(SoftKey::reference(material, params));
    }

    Err(SoftError::UnsupportedEncoding)
}

fn import_public_der(data: &[u8], params: &ImportParams<'_>) -> Result<SoftKey, SoftError> {
    refuse_passphrase(params)?;

    if let Ok(key) = RsaPublicKey::from_pkcs1_der(data) {
        log::trace!("PKCS#1 RSA public key");
        let raw = Some((RawFormat::Pkcs1, data));
        return Ok(SoftKey::new(Material::RsaPublic(key), raw, params));
    }

    if let Ok(key) = dsa::VerifyingKey::from_public_key_der(data) {
        log::trace!("DSA SubjectPublicKeyInfo");
        let raw = Some((RawFormat::X509, data));
        return Ok(SoftKey::new(Material::DsaPublic(key), raw, params));
    }

    if let Ok(key) = RsaPublicKey::from_public_key_der(data) {
        log::trace!("RSA SubjectPublicKeyInfo");
        return Ok(SoftKey::reference(Material::RsaPublic(key), params));
    }

    Err(SoftError::UnsupportedEncoding)
}

fn import_pem(
    data: &[u8],
    params: &ImportParams<'_>,
) -> Result<Vec<ImportedItem<SoftKey>>, SoftError> {
    let blocks = pem::parse(data, params.passphrase)?;
    if params.passphrase.is_some() && !blocks.iter().any(|block| block.encrypted) {
        return Err(SoftError::UnexpectedPassphrase);
    }

    blocks
        .iter()
        .map(|block| import_pem_block(block, params))
        .collect()
}

fn import_pem_block(
    block: &pem::Block,
    params: &ImportParams<'_>,
) -> Result<ImportedItem<SoftKey>, SoftError> {
    let material = match block.label.as_str() {
        "RSA PRIVATE KEY" => Material::RsaPrivate(RsaPrivateKey::from_pkcs1_der(&block.data)?),
        "DSA PRIVATE KEY" => Material::DsaPrivate(openssl_dsa_private(&block.data)?),
        "PRIVATE KEY" => pkcs8_private(&block.data)?,
        pem::ENCRYPTED_PRIVATE_KEY => encrypted_pkcs8_private(&block.data, params.passphrase)?,
        "RSA PUBLIC KEY" => Material::RsaPublic(RsaPublicKey::from_pkcs1_der(&block.data)?),
        "PUBLIC KEY" => spki_public(&block.data)?,
        "CERTIFICATE" => return Ok(ImportedItem::Certificate(block.data.to_vec())),
        other => return Err(SoftError::UnsupportedLabel(other.to_owned())),
    };

    let material = expect_class(material, params)?;
    Ok(ImportedItem::Key(SoftKey::reference(material, params)))
}

/// PEM and `.p8` input is labelled rather than probed, so the requested
/// item type is checked after decoding.
fn expect_class(material: Material, params: &ImportParams<'_>) -> Result<Material, SoftError> {
    let expected = match params.item_type {
        ItemType::Private => KeyClass::Private,
        ItemType::Public => KeyClass::Public,
    };

    match material.class() {
        class if class == expected => Ok(material),
        class => Err(SoftError::UnexpectedClass(class)),
    }
}

fn pkcs8_private(der: &[u8]) -> Result<Material, SoftError> {
    match RsaPrivateKey::from_pkcs8_der(der) {
        Ok(key) => Ok(Material::RsaPrivate(key)),
        Err(_) => Ok(Material::DsaPrivate(dsa::SigningKey::from_pkcs8_der(der)?)),
    }
}

fn encrypted_pkcs8_private(der: &[u8], passphrase: Option<&str>) -> Result<Material, SoftError> {
    let info = EncryptedPrivateKeyInfo::try_from(der)?;
    let passphrase = passphrase.ok_or(SoftError::PassphraseRequired)?;
    let document = info.decrypt(passphrase)?;
    pkcs8_private(document.as_bytes())
}

fn spki_public(der: &[u8]) -> Result<Material, SoftError> {
    match RsaPublicKey::from_public_key_der(der) {
        Ok(key) => Ok(Material::RsaPublic(key)),
        Err(_) => Ok(Material::DsaPublic(dsa::VerifyingKey::from_public_key_der(der)?)),
    }
}

fn openssl_dsa_private(der: &[u8]) -> Result<dsa::SigningKey, SoftError> {
    let key: asn1::DsaPrivateKey<'_> = asn1::decode(der)?;
    if key.version != asn1::DsaPrivateKey::VERSION {
        return Err(SoftError::UnsupportedEncoding);
    }

    let components = dsa::Components::from_components(
        BigUint::from_bytes_be(key.params.p),
        BigUint::from_bytes_be(key.params.q),
        BigUint::from_bytes_be(key.params.g),
    )?;
    let verifying_key =
        dsa::VerifyingKey::from_components(components, BigUint::from_bytes_be(key.public_key))?;
    let x = BigUint::from_bytes_be(key.private_key);
    Ok(dsa::SigningKey::from_components(verifying_key, x)?)
}

fn openssl_dsa_der(key: &dsa::SigningKey) -> Result<Zeroizing<Vec<u8>>, SoftError> {
    let verifying_key = key.verifying_key();
    let components = verifying_key.components();
    let p = components.p().to_bytes_be();
    let q = components.q().to_bytes_be();
    let g = components.g().to_bytes_be();
    let y = verifying_key.y().to_bytes_be();
    let x = Zeroizing::new(key.x().to_bytes_be());

    let der = asn1::encode(&asn1::DsaPrivateKey {
        version: asn1::DsaPrivateKey::VERSION,
        params: asn1::DsaParameters {
            p: &p,
            q: &q,
            g: &g,
        },
        public_key: &y,
        private_key: &x,
    })?;
    Ok(Zeroizing::new(der))
}
