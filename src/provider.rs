//! The boundary to the cryptographic provider.
//!
//! The provider owns all key material and performs every computation: key
//! parsing, raw export, hash-then-sign and verify transforms, and Base64
//! encoding. This crate only transcodes between its opaque key handles and
//! the raw integers SSH exchanges.
//!
//! Key handles follow the usual ownership rules: every handle returned by the
//! provider is owned by the caller, `Clone` takes another reference to the
//! same key and dropping a handle releases it.

use core::fmt;
use std::path::Path;

use zeroize::Zeroizing;

pub use crate::key::Algorithm;

#[cfg(feature = "soft")]
#[cfg_attr(docsrs, doc(cfg(feature = "soft")))]
pub mod soft;

/// Whether a key carries private material.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyClass {
    /// Public key only.
    Public,
    /// Private key; the public half can be derived from it.
    Private,
}

/// Raw (provider-native, unwrapped) key encodings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RawFormat {
    /// PKCS#1 `RSAPrivateKey` / `RSAPublicKey`.
    Pkcs1,
    /// OpenSSL's traditional `DSAPrivateKey`.
    OpenSsl,
    /// X.509 `SubjectPublicKeyInfo`.
    X509,
}

impl Algorithm {
    /// The raw format a key of this algorithm and class is unwrapped to.
    pub fn raw_format(self, class: KeyClass) -> RawFormat {
        match (self, class) {
            (Algorithm::Rsa, _) => RawFormat::Pkcs1,
            (Algorithm::Dsa, KeyClass::Private) => RawFormat::OpenSsl,
            (Algorithm::Dsa, KeyClass::Public) => RawFormat::X509,
        }
    }
}

/// Describes a key without exposing its material.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyHeader {
    /// Key algorithm.
    pub algorithm: Algorithm,
    /// Public or private.
    pub class: KeyClass,
    /// Encoding of the raw blob, when there is one.
    pub format: RawFormat,
}

/// How the provider holds a key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlobType {
    /// The key bytes are stored in raw form and can be read directly.
    Raw,
    /// The key is a reference into provider storage; it must be wrapped
    /// (exported) to obtain a raw form.
    Reference,
}

/// The blob backing a key handle.
#[derive(Clone, Copy, Debug)]
pub struct KeyBlob<'k> {
    /// Key description.
    pub header: KeyHeader,
    /// Raw or reference.
    pub blob_type: BlobType,
    /// Raw key bytes; empty for reference blobs.
    pub data: &'k [u8],
}

/// A raw key materialised by [`Provider::wrap_key`].
pub struct RawKey {
    /// Description of the exported bytes.
    pub header: KeyHeader,
    /// Exported bytes, zeroized on drop.
    pub data: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKey")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// What kind of item an import is looking for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ItemType {
    /// A private key.
    Private,
    /// A public key.
    Public,
}

/// Parameters for [`Provider::import_items`].
#[derive(Clone, Copy)]
pub struct ImportParams<'a> {
    /// Narrows format probing to private or public key grammars.
    pub item_type: ItemType,
    /// Source file path. Only the extension is consulted, as a format hint.
    pub path: Option<&'a Path>,
    /// Passphrase for encrypted encodings.
    pub passphrase: Option<&'a str>,
    /// Whether imported private keys may later be exported with
    /// [`Provider::wrap_key`].
    pub extractable: bool,
}

impl<'a> ImportParams<'a> {
    /// Parameters for importing an extractable key of the given type.
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            path: None,
            passphrase: None,
            extractable: true,
        }
    }

    /// Set the source path hint.
    pub fn with_path(mut self, path: Option<&'a Path>) -> Self {
        self.path = path;
        self
    }

    /// Set the passphrase.
    pub fn with_passphrase(mut self, passphrase: Option<&'a str>) -> Self {
        self.passphrase = passphrase;
        self
    }

    /// Lowercased extension of the source path, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

impl fmt::Debug for ImportParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportParams")
            .field("item_type", &self.item_type)
            .field("path", &self.path)
            .field("passphrase", &self.passphrase.map(|_| "<redacted>"))
            .field("extractable", &self.extractable)
            .finish()
    }
}

/// One item produced by an import.
#[derive(Clone, Debug)]
pub enum ImportedItem<K> {
    /// A key handle.
    Key(K),
    /// A DER certificate; never accepted where a key is expected.
    Certificate(Vec<u8>),
}

/// Digest algorithms used by sign and verify transforms.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DigestAlgorithm {
    /// SHA-1, the only digest of `ssh-rsa` and `ssh-dss`.
    Sha1,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
        }
    }
}

/// A cryptographic provider.
pub trait Provider {
    /// Opaque key handle. `Clone` acquires a reference, `Drop` releases it.
    type Key: Clone + fmt::Debug;

    /// Provider error. Its detail is logged but never returned to callers of
    /// this crate.
    type Error: fmt::Debug + fmt::Display;

    /// Probe `data` across all supported encodings and return every item found.
    fn import_items(
        &self,
        data: &[u8],
        params: &ImportParams<'_>,
    ) -> Result<Vec<ImportedItem<Self::Key>>, Self::Error>;

    /// The blob backing `key`.
    fn key_blob<'k>(&self, key: &'k Self::Key) -> Result<KeyBlob<'k>, Self::Error>;

    /// Export `key` in the requested raw format.
    ///
    /// Public keys may be exported in the raw format native to their class
    /// instead; the returned header says which.
    fn wrap_key(&self, key: &Self::Key, format: RawFormat) -> Result<RawKey, Self::Error>;

    /// Sign a precomputed `digest` with a private key.
    ///
    /// RSA returns the PKCS#1 v1.5 signature, DSA a DER `Dss-Sig-Value`.
    fn sign_digest(
        &self,
        key: &Self::Key,
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, Self::Error>;

    /// Hash `message` and verify `signature` over it.
    ///
    /// Returns `Ok(false)` for a well-formed evaluation that rejects the
    /// signature and `Err` when no evaluation was possible.
    fn verify_message(
        &self,
        key: &Self::Key,
        algorithm: DigestAlgorithm,
        signature: &[u8],
        message: &[u8],
    ) -> Result<bool, Self::Error>;

    /// Base64-encode `data`, wrapped at 64 columns.
    fn encode_base64(&self, data: &[u8]) -> Result<String, Self::Error>;
}
