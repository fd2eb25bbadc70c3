//! SSH public key blobs (RFC 4253 section 6.6).
//!
//! ```text
//! string  "ssh-rsa"    string  "ssh-dss"
//! mpint   e            mpint   p
//! mpint   n            mpint   q
//!                      mpint   g
//!                      mpint   y
//! ```

use std::path::Path;

use crate::errors::{Error, Result};
use crate::import;
use crate::key::{Algorithm, DsaPublicComponents, PublicComponents, RsaPublicComponents};
use crate::provider::Provider;
use crate::raw;

/// An encoded public key and its method name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKeyBlob {
    /// `ssh-rsa` or `ssh-dss`.
    pub method: &'static str,
    /// The wire blob, starting with the length-prefixed method name.
    pub blob: Vec<u8>,
}

/// Append an SSH `string`.
pub fn write_string(buf: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| Error::Wire)?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
    Ok(())
}

/// Append an unsigned big-endian integer as an SSH `mpint`.
///
/// Leading zero bytes are dropped and a single zero is put back when the
/// top bit is set. Zero is the empty string.
pub fn write_mpint(buf: &mut Vec<u8>, magnitude: &[u8]) -> Result<()> {
    let start = magnitude
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(magnitude.len());
    let magnitude = &magnitude[start..];

    match magnitude.first() {
        Some(first) if first & 0x80 != 0 => {
            let len = u32::try_from(magnitude.len() + 1).map_err(|_| Error::Wire)?;
            buf.extend_from_slice(&len.to_be_bytes());
            buf.push(0);
            buf.extend_from_slice(magnitude);
            Ok(())
        }
        _ => write_string(buf, magnitude),
    }
}

/// Encode public components as a wire blob.
pub fn encode_public_key(components: &PublicComponents) -> Result<PublicKeyBlob> {
    let method = components.algorithm().ssh_name();

    let mut blob = Vec::new();
    write_string(&mut blob, method.as_bytes())?;
    match components {
        PublicComponents::Rsa(key) => {
            write_mpint(&mut blob, &key.e)?;
            write_mpint(&mut blob, &key.n)?;
        }
        PublicComponents::Dsa(key) => {
            write_mpint(&mut blob, &key.p)?;
            write_mpint(&mut blob, &key.q)?;
            write_mpint(&mut blob, &key.g)?;
            write_mpint(&mut blob, &key.y)?;
        }
    }

    Ok(PublicKeyBlob { method, blob })
}

/// Parse an `ssh-rsa` or `ssh-dss` wire blob.
pub fn decode_public_key(blob: &[u8]) -> Result<PublicComponents> {
    let mut reader = Reader(blob);
    let method = reader.string()?;
    let components = match Algorithm::from_ssh_name(method) {
        Some(Algorithm::Rsa) => PublicComponents::Rsa(RsaPublicComponents {
            e: reader.mpint()?,
            n: reader.mpint()?,
        }),
        Some(Algorithm::Dsa) => PublicComponents::Dsa(DsaPublicComponents {
            p: reader.mpint()?,
            q: reader.mpint()?,
            g: reader.mpint()?,
            y: reader.mpint()?,
        }),
        None => return Err(Error::UnsupportedAlgorithm),
    };

    if !reader.0.is_empty() {
        return Err(Error::Wire);
    }
    Ok(components)
}

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn string(&mut self) -> Result<&'a [u8]> {
        if self.0.len() < 4 {
            return Err(Error::Wire);
        }
        let (len, rest) = self.0.split_at(4);
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
        if rest.len() < len {
            return Err(Error::Wire);
        }
        let (value, rest) = rest.split_at(len);
        self.0 = rest;
        Ok(value)
    }

    fn mpint(&mut self) -> Result<Vec<u8>> {
        match self.string()? {
            [first, ..] if first & 0x80 != 0 => Err(Error::Wire),
            [0, next, ..] if next & 0x80 == 0 => Err(Error::Wire),
            [0] => Err(Error::Wire),
            [0, rest @ ..] => Ok(rest.to_vec()),
            value => Ok(value.to_vec()),
        }
    }
}

/// Wire blob for the public half of `key`, which may be public or private.
pub fn public_key_blob<P: Provider>(provider: &P, key: &P::Key) -> Result<PublicKeyBlob> {
    encode_public_key(&raw::public_components(provider, key)?)
}

/// Import a private key from memory and return its public wire blob.
pub fn public_key_from_memory<P: Provider>(
    provider: &P,
    data: &[u8],
    passphrase: Option<&str>,
) -> Result<PublicKeyBlob> {
    let key = import::private_key_from_memory(provider, data, passphrase)?;
    let public = raw::public_key(provider, &key)?;
    public_key_blob(provider, &public)
}

/// Read a private key file and return its public wire blob.
///
/// The path is handed to the importer, so an unencrypted `.p8` file goes
/// through the same PKCS#8 PEM envelope as [`import::import_key`].
pub fn public_key_from_path<P: Provider>(
    provider: &P,
    path: impl AsRef<Path>,
    passphrase: Option<&str>,
) -> Result<PublicKeyBlob> {
    let key = import::private_key_from_path(provider, path, passphrase)?;
    let public = raw::public_key(provider, &key)?;
    public_key_blob(provider, &public)
}
