//! `ssh-rsa` and `ssh-dss` signatures over SHA-1.
//!
//! Signing hands a precomputed digest to the provider. Verification hands
//! over the message itself and lets the provider hash it.
//!
//! DSA signatures are a DER `Dss-Sig-Value` on the provider side and the
//! fixed 40-byte `r || s` concatenation on the SSH side.

use crate::asn1;
use crate::errors::{Error, Result};
use crate::key::Algorithm;
use crate::provider::{DigestAlgorithm, Provider};
use crate::raw;

/// Length of each DSA signature integer in SSH form.
pub const DSA_INTEGER_LEN: usize = 20;

/// Length of an SSH DSA signature.
pub const DSA_SIGNATURE_LEN: usize = 2 * DSA_INTEGER_LEN;

/// Outcome of a verification that could be evaluated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verification {
    /// The signature matches.
    Valid,
    /// The signature does not match.
    Invalid,
}

impl Verification {
    /// Is this [`Verification::Valid`]?
    pub fn is_valid(self) -> bool {
        self == Verification::Valid
    }
}

/// Sign a SHA-1 `digest`, returning the provider's signature bytes.
pub fn sign_digest<P: Provider>(provider: &P, key: &P::Key, digest: &[u8]) -> Result<Vec<u8>> {
    provider
        .sign_digest(key, DigestAlgorithm::Sha1, digest)
        .map_err(|err| {
            log::debug!("signing transform failed: {}", err);
            Error::Sign
        })
}

/// Verify provider-format `signature` over `message` with `key`.
///
/// `Err` means the verification could not be evaluated at all.
pub fn check_signature<P: Provider>(
    provider: &P,
    key: &P::Key,
    signature: &[u8],
    message: &[u8],
) -> Result<Verification> {
    match provider.verify_message(key, DigestAlgorithm::Sha1, signature, message) {
        Ok(true) => Ok(Verification::Valid),
        Ok(false) => Ok(Verification::Invalid),
        Err(err) => {
            log::debug!("verify transform failed: {}", err);
            Err(Error::Verify)
        }
    }
}

/// [`check_signature`] collapsed to a boolean: errors count as invalid.
pub fn verify_signature<P: Provider>(
    provider: &P,
    key: &P::Key,
    signature: &[u8],
    message: &[u8],
) -> bool {
    matches!(
        check_signature(provider, key, signature, message),
        Ok(Verification::Valid)
    )
}

/// Sign a SHA-1 digest with an RSA private key. The PKCS#1 v1.5 signature
/// is already in SSH form.
pub fn rsa_sha1_sign<P: Provider>(provider: &P, key: &P::Key, digest: &[u8]) -> Result<Vec<u8>> {
    expect_algorithm(provider, key, Algorithm::Rsa)?;
    sign_digest(provider, key, digest)
}

/// Verify an `ssh-rsa` signature. `key` may be private or public.
pub fn rsa_sha1_verify<P: Provider>(
    provider: &P,
    key: &P::Key,
    signature: &[u8],
    message: &[u8],
) -> bool {
    match public_key(provider, key, Algorithm::Rsa) {
        Ok(public) => verify_signature(provider, &public, signature, message),
        Err(_) => false,
    }
}

/// Sign a SHA-1 digest with a DSA private key, returning `r || s`.
pub fn dsa_sha1_sign<P: Provider>(
    provider: &P,
    key: &P::Key,
    digest: &[u8],
) -> Result<[u8; DSA_SIGNATURE_LEN]> {
    expect_algorithm(provider, key, Algorithm::Dsa)?;
    let der = sign_digest(provider, key, digest)?;
    dsa_signature_to_ssh(&der)
}

/// Verify an `ssh-dss` signature. `key` may be private or public.
pub fn dsa_sha1_verify<P: Provider>(
    provider: &P,
    key: &P::Key,
    signature: &[u8; DSA_SIGNATURE_LEN],
    message: &[u8],
) -> bool {
    let der = match dsa_signature_to_der(signature) {
        Ok(der) => der,
        Err(err) => {
            log::debug!("cannot encode DSA signature: {}", err);
            return false;
        }
    };

    match public_key(provider, key, Algorithm::Dsa) {
        Ok(public) => verify_signature(provider, &public, &der, message),
        Err(_) => false,
    }
}

/// Convert a DER `Dss-Sig-Value` into the 40-byte SSH form.
///
/// Integers shorter than 20 bytes are left-padded with zeros; longer ones
/// make the signature malformed. RFC 4253 §6.6 defines `r` and `s` as
/// 160-bit integers, so a DER value that dropped leading zero octets still
/// fills its 20-byte slot.
pub fn dsa_signature_to_ssh(der: &[u8]) -> Result<[u8; DSA_SIGNATURE_LEN]> {
    let signature: asn1::DsaSignature<'_> = asn1::decode(der).map_err(|err| {
        log::debug!("DSA signature does not decode: {}", err);
        Error::MalformedSignature
    })?;

    let mut out = [0u8; DSA_SIGNATURE_LEN];
    let (r, s) = out.split_at_mut(DSA_INTEGER_LEN);
    left_pad(signature.r, r)?;
    left_pad(signature.s, s)?;
    Ok(out)
}

/// Convert a 40-byte SSH DSA signature into a DER `Dss-Sig-Value`.
pub fn dsa_signature_to_der(signature: &[u8; DSA_SIGNATURE_LEN]) -> Result<Vec<u8>> {
    let (r, s) = signature.split_at(DSA_INTEGER_LEN);
    asn1::encode(&asn1::DsaSignature { r, s })
}

fn left_pad(value: &[u8], out: &mut [u8]) -> Result<()> {
    let offset = out
        .len()
        .checked_sub(value.len())
        .ok_or(Error::MalformedSignature)?;
    out[offset..].copy_from_slice(value);
    Ok(())
}

fn expect_algorithm<P: Provider>(provider: &P, key: &P::Key, expected: Algorithm) -> Result<()> {
    let algorithm = provider
        .key_blob(key)
        .map_err(|err| {
            log::debug!("key blob unavailable: {}", err);
            Error::UnsupportedAlgorithm
        })?
        .header
        .algorithm;

    if algorithm == expected {
        Ok(())
    } else {
        log::debug!("expected a {:?} key, found {:?}", expected, algorithm);
        Err(Error::UnsupportedAlgorithm)
    }
}

fn public_key<P: Provider>(provider: &P, key: &P::Key, expected: Algorithm) -> Result<P::Key> {
    expect_algorithm(provider, key, expected)?;
    raw::public_key(provider, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn high_bit_integers_survive_round_trip() {
        let signature = hex!(
            "80000000000000000000000000000000000000ff"
            "ff00000000000000000000000000000000000080"
        );
        let der = dsa_signature_to_der(&signature).unwrap();
        assert_eq!(der.len(), 2 + 2 * (2 + 21));
        assert_eq!(dsa_signature_to_ssh(&der).unwrap(), signature);
    }

    #[test]
    fn short_integers_are_padded() {
        let signature = hex!(
            "0000000000000000000000000000000000000001"
            "00000000000000000000000000000000000000ff"
        );
        let der = dsa_signature_to_der(&signature).unwrap();
        assert_eq!(der, hex!("3007 020101 020200ff"));
        assert_eq!(dsa_signature_to_ssh(&der).unwrap(), signature);
    }

    #[test]
    fn oversized_integers_are_malformed() {
        // r is 21 significant bytes
        let der = hex!(
            "301a"
            "0215 010000000000000000000000000000000000000000"
            "020101"
        );
        assert!(matches!(
            dsa_signature_to_ssh(&der),
            Err(Error::MalformedSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        for der in [&[][..], &hex!("3003 020101")[..], &hex!("0400")[..]] {
            assert!(matches!(
                dsa_signature_to_ssh(der),
                Err(Error::MalformedSignature)
            ));
        }
    }
}
