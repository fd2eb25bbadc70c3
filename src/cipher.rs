//! Symmetric ciphers for the SSH transport.
//!
//! A [`Cipher`] is keyed once and then fed the packet stream in place. All
//! chaining state (CBC feedback, CTR counter, RC4 state) stays inside it.

use aes::cipher::{
    generic_array::GenericArray, BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser,
    KeyInit, KeyIvInit, StreamCipher,
};
use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cast5::Cast5;
use core::fmt;
use des::TdesEde3;
use rc4::{consts::U16, Rc4};

use crate::errors::{Error, Result};

/// Supported SSH ciphers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum CipherAlgorithm {
    /// AES-256 in CBC mode.
    Aes256Cbc,
    /// AES-192 in CBC mode.
    Aes192Cbc,
    /// AES-128 in CBC mode.
    Aes128Cbc,
    /// AES-256 in CTR mode.
    Aes256Ctr,
    /// AES-192 in CTR mode.
    Aes192Ctr,
    /// AES-128 in CTR mode.
    Aes128Ctr,
    /// Blowfish in CBC mode.
    Blowfish,
    /// RC4 with a 128-bit key.
    Arcfour,
    /// CAST-128 in CBC mode.
    Cast5,
    /// Three-key triple DES in CBC mode.
    TripleDes,
}

impl CipherAlgorithm {
    /// Key length in bytes.
    pub fn key_size(self) -> usize {
        match self {
            CipherAlgorithm::Aes256Cbc | CipherAlgorithm::Aes256Ctr => 32,
            CipherAlgorithm::Aes192Cbc | CipherAlgorithm::Aes192Ctr => 24,
            CipherAlgorithm::Aes128Cbc | CipherAlgorithm::Aes128Ctr => 16,
            CipherAlgorithm::Blowfish => 16,
            CipherAlgorithm::Arcfour => 16,
            CipherAlgorithm::Cast5 => 16,
            CipherAlgorithm::TripleDes => 24,
        }
    }

    /// Block length in bytes, the unit SSH packets are padded to.
    pub fn block_size(self) -> usize {
        match self {
            CipherAlgorithm::Aes256Cbc
            | CipherAlgorithm::Aes192Cbc
            | CipherAlgorithm::Aes128Cbc
            | CipherAlgorithm::Aes256Ctr
            | CipherAlgorithm::Aes192Ctr
            | CipherAlgorithm::Aes128Ctr => 16,
            CipherAlgorithm::Blowfish
            | CipherAlgorithm::Arcfour
            | CipherAlgorithm::Cast5
            | CipherAlgorithm::TripleDes => 8,
        }
    }

    /// IV length in bytes; zero for RC4.
    pub fn iv_size(self) -> usize {
        match self {
            CipherAlgorithm::Arcfour => 0,
            other => other.block_size(),
        }
    }

    /// Is this a CBC cipher, which only accepts whole blocks?
    pub fn is_cbc(self) -> bool {
        matches!(
            self,
            CipherAlgorithm::Aes256Cbc
                | CipherAlgorithm::Aes192Cbc
                | CipherAlgorithm::Aes128Cbc
                | CipherAlgorithm::Blowfish
                | CipherAlgorithm::Cast5
                | CipherAlgorithm::TripleDes
        )
    }

    /// Name used in SSH algorithm negotiation.
    pub fn ssh_name(self) -> &'static str {
        match self {
            CipherAlgorithm::Aes256Cbc => "aes256-cbc",
            CipherAlgorithm::Aes192Cbc => "aes192-cbc",
            CipherAlgorithm::Aes128Cbc => "aes128-cbc",
            CipherAlgorithm::Aes256Ctr => "aes256-ctr",
            CipherAlgorithm::Aes192Ctr => "aes192-ctr",
            CipherAlgorithm::Aes128Ctr => "aes128-ctr",
            CipherAlgorithm::Blowfish => "blowfish-cbc",
            CipherAlgorithm::Arcfour => "arcfour",
            CipherAlgorithm::Cast5 => "cast128-cbc",
            CipherAlgorithm::TripleDes => "3des-cbc",
        }
    }
}

/// Whether a [`Cipher`] encrypts or decrypts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// A keyed cipher context. Dropping it releases the key schedule.
pub struct Cipher {
    algorithm: CipherAlgorithm,
    direction: Direction,
    transform: Box<dyn Transform>,
}

impl Cipher {
    /// Key a cipher.
    ///
    /// `key` and `iv` must be at least [`CipherAlgorithm::key_size`] and
    /// [`CipherAlgorithm::iv_size`] bytes long; only that prefix is used.
    pub fn init(
        algorithm: CipherAlgorithm,
        iv: &[u8],
        key: &[u8],
        direction: Direction,
    ) -> Result<Self> {
        let key = key.get(..algorithm.key_size()).ok_or_else(|| {
            log::debug!(
                "{} needs a {}-byte key, got {}",
                algorithm.ssh_name(),
                algorithm.key_size(),
                key.len()
            );
            Error::Cipher
        })?;
        let iv = iv.get(..algorithm.iv_size()).ok_or_else(|| {
            log::debug!(
                "{} needs a {}-byte IV, got {}",
                algorithm.ssh_name(),
                algorithm.iv_size(),
                iv.len()
            );
            Error::Cipher
        })?;

        let transform = match algorithm {
            CipherAlgorithm::Aes256Cbc => cbc_mode::<Aes256>(key, iv, direction)?,
            CipherAlgorithm::Aes192Cbc => cbc_mode::<Aes192>(key, iv, direction)?,
            CipherAlgorithm::Aes128Cbc => cbc_mode::<Aes128>(key, iv, direction)?,
            CipherAlgorithm::Blowfish => cbc_mode::<Blowfish>(key, iv, direction)?,
            CipherAlgorithm::Cast5 => cbc_mode::<Cast5>(key, iv, direction)?,
            CipherAlgorithm::TripleDes => cbc_mode::<TdesEde3>(key, iv, direction)?,
            CipherAlgorithm::Aes256Ctr => {
                stream(ctr::Ctr128BE::<Aes256>::new_from_slices(key, iv)?)
            }
            CipherAlgorithm::Aes192Ctr => {
                stream(ctr::Ctr128BE::<Aes192>::new_from_slices(key, iv)?)
            }
            CipherAlgorithm::Aes128Ctr => {
                stream(ctr::Ctr128BE::<Aes128>::new_from_slices(key, iv)?)
            }
            CipherAlgorithm::Arcfour => stream(Rc4::<U16>::new_from_slice(key)?),
        };

        Ok(Cipher {
            algorithm,
            direction,
            transform,
        })
    }

    /// Transform `block` in place.
    ///
    /// CBC ciphers reject input that is not a whole number of blocks and
    /// leave the buffer untouched.
    pub fn crypt(&mut self, block: &mut [u8]) -> Result<()> {
        self.transform.apply(block)
    }

    /// The algorithm this context was keyed for.
    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// The direction this context was keyed for.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("algorithm", &self.algorithm)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

trait Transform: Send {
    fn apply(&mut self, buf: &mut [u8]) -> Result<()>;
}

struct CbcEncrypt<C: BlockEncryptMut + BlockCipher>(cbc::Encryptor<C>);

struct CbcDecrypt<C: BlockDecryptMut + BlockCipher>(cbc::Decryptor<C>);

struct Stream<S>(S);

impl<C> Transform for CbcEncrypt<C>
where
    C: BlockEncryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) -> Result<()> {
        let block_size = C::block_size();
        whole_blocks(buf, block_size)?;
        for block in buf.chunks_exact_mut(block_size) {
            self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}

impl<C> Transform for CbcDecrypt<C>
where
    C: BlockDecryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) -> Result<()> {
        let block_size = C::block_size();
        whole_blocks(buf, block_size)?;
        for block in buf.chunks_exact_mut(block_size) {
            self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}

impl<S> Transform for Stream<S>
where
    S: StreamCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) -> Result<()> {
        self.0.try_apply_keystream(buf)?;
        Ok(())
    }
}

fn whole_blocks(buf: &[u8], block_size: usize) -> Result<()> {
    if buf.len() % block_size == 0 {
        Ok(())
    } else {
        log::debug!(
            "{} bytes is not a multiple of the {}-byte block",
            buf.len(),
            block_size
        );
        Err(Error::Cipher)
    }
}

fn cbc_mode<C>(key: &[u8], iv: &[u8], direction: Direction) -> Result<Box<dyn Transform>>
where
    C: BlockEncryptMut + BlockDecryptMut + BlockCipher + KeyInit + Send + 'static,
{
    Ok(match direction {
        Direction::Encrypt => Box::new(CbcEncrypt(cbc::Encryptor::<C>::new_from_slices(
            key, iv,
        )?)),
        Direction::Decrypt => Box::new(CbcDecrypt(cbc::Decryptor::<C>::new_from_slices(
            key, iv,
        )?)),
    })
}

fn stream<S: StreamCipher + Send + 'static>(cipher: S) -> Box<dyn Transform> {
    Box::new(Stream(cipher))
}
