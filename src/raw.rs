//! Raw-key unwrapping.
//!
//! A provider key handle is either backed by a raw blob, which is read in
//! place, or by a reference that has to be exported first. Either way the raw
//! bytes are only lent to a callback: [`RawKeyView`] cannot outlive it, and
//! exported bytes are zeroized as soon as it returns.

use core::fmt;

use crate::asn1;
use crate::errors::{Error, Result};
use crate::import;
use crate::key::{Algorithm, DsaPublicComponents, PublicComponents, RsaPublicComponents};
use crate::provider::{BlobType, KeyClass, KeyHeader, Provider, RawFormat};

/// Raw key bytes, valid for the duration of a [`with_raw_key`] callback.
#[derive(Clone, Copy)]
pub struct RawKeyView<'a> {
    header: KeyHeader,
    data: &'a [u8],
}

impl<'a> RawKeyView<'a> {
    /// Description of the raw bytes.
    pub fn header(&self) -> KeyHeader {
        self.header
    }

    /// The raw DER.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Decode the raw DER and copy out the public components.
    pub fn public_components(&self) -> Result<PublicComponents> {
        let KeyHeader {
            algorithm,
            class,
            format,
        } = self.header;

        match (algorithm, class, format) {
            (Algorithm::Rsa, KeyClass::Private, RawFormat::Pkcs1) => {
                let key: asn1::RsaPrivateKey<'_> = asn1::decode(self.data)?;
                Ok(rsa_components(key.public_key()))
            }
            (Algorithm::Rsa, KeyClass::Public, RawFormat::Pkcs1) => {
                let key: asn1::RsaPublicKey<'_> = asn1::decode(self.data)?;
                Ok(rsa_components(key))
            }
            (Algorithm::Dsa, KeyClass::Private, RawFormat::OpenSsl) => {
                let key: asn1::DsaPrivateKey<'_> = asn1::decode(self.data)?;
                Ok(dsa_components(key.params, key.public_key))
            }
            (Algorithm::Dsa, KeyClass::Public, RawFormat::X509) => {
                let key: asn1::DsaPublicKey<'_> = asn1::decode(self.data)?;
                Ok(dsa_components(key.algorithm.params, key.y()?))
            }
            _ => {
                log::debug!("no decoder for {:?} {:?} as {:?}", algorithm, class, format);
                Err(Error::UnsupportedAlgorithm)
            }
        }
    }
}

impl fmt::Debug for RawKeyView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKeyView")
            .field("header", &self.header)
            .field("len", &self.data.len())
            .finish()
    }
}

fn rsa_components(key: asn1::RsaPublicKey<'_>) -> PublicComponents {
    PublicComponents::Rsa(RsaPublicComponents {
        e: key.public_exponent.to_vec(),
        n: key.modulus.to_vec(),
    })
}

fn dsa_components(params: asn1::DsaParameters<'_>, y: &[u8]) -> PublicComponents {
    PublicComponents::Dsa(DsaPublicComponents {
        p: params.p.to_vec(),
        q: params.q.to_vec(),
        g: params.g.to_vec(),
        y: y.to_vec(),
    })
}

/// Lend the raw form of `key` to `f`.
///
/// Raw blobs are handed over in place. Reference keys are exported in
/// `format`, passed to `f` and discarded. Returns `None` when no raw form
/// can be produced.
pub fn with_raw_key<P, F, R>(provider: &P, key: &P::Key, format: RawFormat, f: F) -> Option<R>
where
    P: Provider,
    F: FnOnce(RawKeyView<'_>) -> R,
{
    let blob = match provider.key_blob(key) {
        Ok(blob) => blob,
        Err(err) => {
            log::debug!("key blob unavailable: {}", err);
            return None;
        }
    };

    if blob.blob_type == BlobType::Raw {
        log::trace!("reading raw {:?} blob in place", blob.header.format);
        return Some(f(RawKeyView {
            header: blob.header,
            data: blob.data,
        }));
    }

    log::trace!("exporting reference key as {:?}", format);
    match provider.wrap_key(key, format) {
        Ok(raw) => Some(f(RawKeyView {
            header: raw.header,
            data: &raw.data,
        })),
        Err(err) => {
            log::debug!("raw export failed: {}", err);
            None
        }
    }
}

/// The raw format `key` is unwrapped to: PKCS#1 for RSA, OpenSSL for DSA.
///
/// Public DSA keys come back as `SubjectPublicKeyInfo` even though the
/// OpenSSL format is requested.
pub fn raw_format<P: Provider>(provider: &P, key: &P::Key) -> Result<RawFormat> {
    let blob = provider.key_blob(key).map_err(|err| {
        log::debug!("key blob unavailable: {}", err);
        Error::UnwrapUnavailable
    })?;
    Ok(blob.header.algorithm.raw_format(KeyClass::Private))
}

/// Public components of `key`, which may be public or private.
pub fn public_components<P: Provider>(provider: &P, key: &P::Key) -> Result<PublicComponents> {
    let format = raw_format(provider, key)?;
    with_raw_key(provider, key, format, |view| view.public_components())
        .ok_or(Error::UnwrapUnavailable)?
}

/// The public key belonging to `key`.
///
/// A key that is already public is returned as a new handle to the same key.
pub fn public_key<P: Provider>(provider: &P, key: &P::Key) -> Result<P::Key> {
    let format = raw_format(provider, key)?;
    let components = with_raw_key(provider, key, format, |view| match view.header().class {
        KeyClass::Public => Ok(None),
        KeyClass::Private => view.public_components().map(Some),
    })
    .ok_or(Error::UnwrapUnavailable)??;

    match components {
        None => {
            log::debug!("key is already public");
            Ok(key.clone())
        }
        Some(components) => import::public_from_components(provider, &components),
    }
}

#[cfg(all(test, feature = "soft"))]
mod tests {
    use super::*;
    use crate::provider::soft::{SoftKey, SoftProvider};
    use crate::provider::{ImportParams, ImportedItem, ItemType};

    const RSA_DER: &[u8] = include_bytes!("../tests/examples/rsa2048.der");
    const RSA_PEM: &[u8] = include_bytes!("../tests/examples/rsa2048.pem");
    const DSA_PEM: &[u8] = include_bytes!("../tests/examples/dsa1024.pem");

    fn import(data: &[u8], params: ImportParams<'_>) -> SoftKey {
        let items = SoftProvider.import_items(data, &params).unwrap();
        match items.into_iter().next() {
            Some(ImportedItem::Key(key)) => key,
            _ => panic!("no key"),
        }
    }

    #[test]
    fn raw_blob_is_lent_in_place() {
        let provider = SoftProvider::new();
        let key = import(RSA_DER, ImportParams::new(ItemType::Private));
        let blob_ptr = provider.key_blob(&key).unwrap().data.as_ptr();

        let view_ptr = with_raw_key(&provider, &key, RawFormat::Pkcs1, |view| {
            assert_eq!(view.data(), RSA_DER);
            view.data().as_ptr()
        });
        assert_eq!(view_ptr, Some(blob_ptr));
    }

    #[test]
    fn reference_key_is_exported() {
        let provider = SoftProvider::new();
        let key = import(RSA_PEM, ImportParams::new(ItemType::Private));

        let len = with_raw_key(&provider, &key, RawFormat::Pkcs1, |view| {
            assert_eq!(view.header().class, KeyClass::Private);
            view.data().len()
        });
        assert_eq!(len, Some(RSA_DER.len()));
    }

    #[test]
    fn export_failure_is_none() {
        let provider = SoftProvider::new();
        let mut params = ImportParams::new(ItemType::Private);
        params.extractable = false;
        let key = import(RSA_PEM, params);

        assert_eq!(with_raw_key(&provider, &key, RawFormat::Pkcs1, |_| ()), None);
        assert!(matches!(
            public_key(&provider, &key),
            Err(Error::UnwrapUnavailable)
        ));
    }

    #[test]
    fn public_key_of_public_key_is_the_same_key() {
        let provider = SoftProvider::new();
        let private = import(DSA_PEM, ImportParams::new(ItemType::Private));

        let public = public_key(&provider, &private).unwrap();
        assert_eq!(public.header().class, KeyClass::Public);
        assert_eq!(public.handle_count(), 1);

        let again = public_key(&provider, &public).unwrap();
        assert_eq!(public.handle_count(), 2);
        drop(again);
        assert_eq!(public.handle_count(), 1);

        assert_eq!(
            public_components(&provider, &private).unwrap(),
            public_components(&provider, &public).unwrap()
        );
    }
}
