//! PEM containers, including OpenSSL's legacy `Proc-Type`/`DEK-Info` encryption.

use aes::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use base64ct::{Base64, Encoding};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use super::SoftError;

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";

/// Label of an encrypted PKCS#8 document.
pub(super) const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

/// One decoded PEM block.
pub(super) struct Block {
    pub label: String,
    pub data: Zeroizing<Vec<u8>>,
    /// The block was, or still is, protected by a passphrase.
    pub encrypted: bool,
}

/// Does `data` contain a PEM pre-encapsulation boundary?
pub(super) fn is_pem(data: &[u8]) -> bool {
    data.windows(BEGIN.len()).any(|window| window == BEGIN.as_bytes())
}

/// Split `data` into PEM blocks and decode each of them.
///
/// Legacy encrypted blocks are decrypted with `passphrase`; PKCS#8
/// `ENCRYPTED PRIVATE KEY` blocks are returned still encrypted.
pub(super) fn parse(data: &[u8], passphrase: Option<&str>) -> Result<Vec<Block>, SoftError> {
    let text = core::str::from_utf8(data).map_err(|_| SoftError::MalformedPem)?;
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(BEGIN) {
        let label_start = start + BEGIN.len();
        let label_len = rest[label_start..]
            .find(DASHES)
            .ok_or(SoftError::MalformedPem)?;
        let label = &rest[label_start..label_start + label_len];

        let footer = format!("{}{}{}", END, label, DASHES);
        let end = rest[start..]
            .find(&footer)
            .map(|offset| start + offset + footer.len())
            .ok_or(SoftError::MalformedPem)?;

        blocks.push(decode_block(&rest[start..end], label, passphrase)?);
        rest = &rest[end..];
    }

    if blocks.is_empty() {
        return Err(SoftError::MalformedPem);
    }

    log::trace!("parsed {} PEM block(s)", blocks.len());
    Ok(blocks)
}

fn decode_block(text: &str, label: &str, passphrase: Option<&str>) -> Result<Block, SoftError> {
    if text.contains("Proc-Type:") {
        return decode_legacy(text, label, passphrase);
    }

    let (label, data) = pem_rfc7468::decode_vec(text.as_bytes())?;
    Ok(Block {
        encrypted: label == ENCRYPTED_PRIVATE_KEY,
        label: label.to_owned(),
        data: Zeroizing::new(data),
    })
}

fn decode_legacy(text: &str, label: &str, passphrase: Option<&str>) -> Result<Block, SoftError> {
    let mut encrypted = false;
    let mut dek_info = None;
    let mut body = String::new();

    for line in text.lines().skip(1).map(str::trim) {
        if line.starts_with(END) {
            break;
        }

        // Base64 never contains ':'
        match line.split_once(':') {
            Some(("Proc-Type", value)) => encrypted = value.trim() == "4,ENCRYPTED",
            Some(("DEK-Info", value)) => dek_info = Some(value.trim()),
            Some(_) => {}
            None => body.push_str(line),
        }
    }

    let dek_info = match dek_info {
        Some(dek_info) if encrypted => dek_info,
        _ => return Err(SoftError::MalformedPem),
    };

    let passphrase = passphrase.ok_or(SoftError::PassphraseRequired)?;
    let ciphertext = Base64::decode_vec(&body)?;
    let data = decrypt(dek_info, passphrase.as_bytes(), &ciphertext)?;
    log::debug!("decrypted legacy PEM block `{}`", label);

    Ok(Block {
        label: label.to_owned(),
        data,
        encrypted: true,
    })
}

#[derive(Clone, Copy, Debug)]
enum LegacyCipher {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
    DesEde3Cbc,
}

impl LegacyCipher {
    fn from_name(name: &str) -> Result<Self, SoftError> {
        match name {
            "AES-128-CBC" => Ok(LegacyCipher::Aes128Cbc),
            "AES-192-CBC" => Ok(LegacyCipher::Aes192Cbc),
            "AES-256-CBC" => Ok(LegacyCipher::Aes256Cbc),
            "DES-EDE3-CBC" => Ok(LegacyCipher::DesEde3Cbc),
            other => Err(SoftError::UnsupportedCipher(other.to_owned())),
        }
    }

    fn key_len(self) -> usize {
        match self {
            LegacyCipher::Aes128Cbc => 16,
            LegacyCipher::Aes192Cbc | LegacyCipher::DesEde3Cbc => 24,
            LegacyCipher::Aes256Cbc => 32,
        }
    }

    fn iv_len(self) -> usize {
        match self {
            LegacyCipher::DesEde3Cbc => 8,
            _ => 16,
        }
    }
}

fn decrypt(
    dek_info: &str,
    passphrase: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, SoftError> {
    let (name, iv) = dek_info.split_once(',').ok_or(SoftError::MalformedPem)?;
    let cipher = LegacyCipher::from_name(name.trim())?;
    let iv = base16ct::mixed::decode_vec(iv.trim()).map_err(|_| SoftError::MalformedPem)?;
    if iv.len() != cipher.iv_len() {
        return Err(SoftError::MalformedPem);
    }

    // OpenSSL salts the key derivation with the first 8 bytes of the IV
    let key = bytes_to_key(passphrase, &iv[..8], cipher.key_len());

    let plaintext = match cipher {
        LegacyCipher::Aes128Cbc => cbc_decrypt::<aes::Aes128>(&key, &iv, ciphertext),
        LegacyCipher::Aes192Cbc => cbc_decrypt::<aes::Aes192>(&key, &iv, ciphertext),
        LegacyCipher::Aes256Cbc => cbc_decrypt::<aes::Aes256>(&key, &iv, ciphertext),
        LegacyCipher::DesEde3Cbc => cbc_decrypt::<des::TdesEde3>(&key, &iv, ciphertext),
    }?;

    Ok(Zeroizing::new(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SoftError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| SoftError::Decrypt)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SoftError::Decrypt)
}

/// `EVP_BytesToKey` with MD5 and a single iteration.
fn bytes_to_key(passphrase: &[u8], salt: &[u8], key_len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(key_len + 16));
    let mut block = Zeroizing::new(Vec::new());

    while key.len() < key_len {
        let digest = Md5::new()
            .chain_update(block.as_slice())
            .chain_update(passphrase)
            .chain_update(salt)
            .finalize();
        block = Zeroizing::new(digest.to_vec());
        key.extend_from_slice(&block);
    }

    key.truncate(key_len);
    key
}
