#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo_small.png")]
#![warn(missing_docs)]

//! # Layers
//!
//! - [`asn1`]: a positional DER codec for the RSA/DSA key and signature
//!   structures the provider consumes and produces.
//! - [`import`]: turning key bytes or raw components into provider keys,
//!   including the PKCS#8 PEM-wrapping fallback for `.p8` files.
//! - [`raw`]: lending the raw form of a key to a callback and deriving
//!   public keys.
//! - [`sign`]: SHA-1 signatures, with DSA repacked to the 40-byte SSH form.
//! - [`wire`]: `ssh-rsa` / `ssh-dss` public key blobs.
//! - [`cipher`]: transport ciphers.
//!
//! Everything is generic over a [`provider::Provider`]; the `soft` feature
//! supplies [`SoftProvider`].
//!
//! # DSA signatures
//!
//! ```
//! # #[cfg(feature = "soft")]
//! # {
//! use ssh_keybridge::{import, sign, SoftProvider};
//! use sha1::{Digest, Sha1};
//!
//! let provider = SoftProvider::new();
//! let key = import::private_key_from_path(&provider, "tests/examples/dsa1024.pem", None)
//!     .expect("failed to import");
//!
//! let message = b"hello world";
//! let signature = sign::dsa_sha1_sign(&provider, &key, &Sha1::digest(message))
//!     .expect("failed to sign");
//! assert_eq!(signature.len(), sign::DSA_SIGNATURE_LEN);
//!
//! let public = ssh_keybridge::raw::public_key(&provider, &key).expect("no public key");
//! assert!(sign::dsa_sha1_verify(&provider, &public, &signature, message));
//! # }
//! ```

#[cfg(doctest)]
pub struct ReadmeDoctests;

pub mod asn1;
pub mod errors;
pub mod import;
pub mod provider;
pub mod raw;
pub mod sign;
pub mod wire;

#[cfg(feature = "cipher")]
pub mod cipher;

mod key;

pub use der;

pub use crate::{
    errors::{Error, Result},
    key::{
        Algorithm, DsaPrivateComponents, DsaPublicComponents, PublicComponents,
        RsaPrivateComponents, RsaPublicComponents,
    },
    provider::Provider,
    sign::Verification,
    wire::PublicKeyBlob,
};

#[cfg(feature = "soft")]
pub use crate::provider::soft::{SoftKey, SoftProvider};
