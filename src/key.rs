use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Asymmetric algorithms understood by this crate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// RSA (`ssh-rsa`).
    Rsa,
    /// DSA (`ssh-dss`).
    Dsa,
}

impl Algorithm {
    /// SSH public key method name.
    pub fn ssh_name(self) -> &'static str {
        match self {
            Algorithm::Rsa => "ssh-rsa",
            Algorithm::Dsa => "ssh-dss",
        }
    }

    /// Parse an SSH public key method name.
    pub fn from_ssh_name(name: &[u8]) -> Option<Self> {
        match name {
            b"ssh-rsa" => Some(Algorithm::Rsa),
            b"ssh-dss" => Some(Algorithm::Dsa),
            _ => None,
        }
    }
}

/// Represents the public part of an RSA key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaPublicComponents {
    /// Public exponent
    pub e: Vec<u8>,
    /// Modulus
    pub n: Vec<u8>,
}

/// Represents a whole RSA key, public and private parts.
///
/// All values are unsigned big-endian integers. Private values are zeroized on drop.
#[derive(Clone, Eq, PartialEq)]
pub struct RsaPrivateComponents {
    /// Modulus
    pub n: Vec<u8>,
    /// Public exponent
    pub e: Vec<u8>,
    /// Private exponent
    pub d: Vec<u8>,
    /// First prime factor
    pub p: Vec<u8>,
    /// Second prime factor
    pub q: Vec<u8>,
    /// `d mod (p-1)`
    pub e1: Vec<u8>,
    /// `d mod (q-1)`
    pub e2: Vec<u8>,
    /// `(inverse of q) mod p`
    pub coeff: Vec<u8>,
}

impl From<&RsaPrivateComponents> for RsaPublicComponents {
    fn from(private_key: &RsaPrivateComponents) -> Self {
        RsaPublicComponents {
            e: private_key.e.clone(),
            n: private_key.n.clone(),
        }
    }
}

impl fmt::Debug for RsaPrivateComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateComponents")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl Zeroize for RsaPrivateComponents {
    fn zeroize(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.e1.zeroize();
        self.e2.zeroize();
        self.coeff.zeroize();
    }
}

impl Drop for RsaPrivateComponents {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for RsaPrivateComponents {}

/// Represents the public part of a DSA key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DsaPublicComponents {
    /// Prime modulus
    pub p: Vec<u8>,
    /// Subgroup order
    pub q: Vec<u8>,
    /// Generator
    pub g: Vec<u8>,
    /// Public value
    pub y: Vec<u8>,
}

/// Represents a whole DSA key. `x` is zeroized on drop.
#[derive(Clone, Eq, PartialEq)]
pub struct DsaPrivateComponents {
    /// Prime modulus
    pub p: Vec<u8>,
    /// Subgroup order
    pub q: Vec<u8>,
    /// Generator
    pub g: Vec<u8>,
    /// Public value
    pub y: Vec<u8>,
    /// Secret exponent
    pub x: Vec<u8>,
}

impl From<&DsaPrivateComponents> for DsaPublicComponents {
    fn from(private_key: &DsaPrivateComponents) -> Self {
        DsaPublicComponents {
            p: private_key.p.clone(),
            q: private_key.q.clone(),
            g: private_key.g.clone(),
            y: private_key.y.clone(),
        }
    }
}

impl fmt::Debug for DsaPrivateComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsaPrivateComponents")
            .field("p", &self.p)
            .field("q", &self.q)
            .field("g", &self.g)
            .field("y", &self.y)
            .finish_non_exhaustive()
    }
}

impl Zeroize for DsaPrivateComponents {
    fn zeroize(&mut self) {
        self.x.zeroize();
    }
}

impl Drop for DsaPrivateComponents {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for DsaPrivateComponents {}

/// Public components of either algorithm, in SSH field order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PublicComponents {
    /// `(e, n)`
    Rsa(RsaPublicComponents),
    /// `(p, q, g, y)`
    Dsa(DsaPublicComponents),
}

impl PublicComponents {
    /// Algorithm of the key these components belong to.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PublicComponents::Rsa(_) => Algorithm::Rsa,
            PublicComponents::Dsa(_) => Algorithm::Dsa,
        }
    }
}

impl From<RsaPublicComponents> for PublicComponents {
    fn from(key: RsaPublicComponents) -> Self {
        PublicComponents::Rsa(key)
    }
}

impl From<DsaPublicComponents> for PublicComponents {
    fn from(key: DsaPublicComponents) -> Self {
        PublicComponents::Dsa(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_into() {
        let private_key = RsaPrivateComponents {
            n: vec![100],
            e: vec![3],
            d: vec![123],
            p: vec![],
            q: vec![],
            e1: vec![],
            e2: vec![],
            coeff: vec![],
        };
        let public_key = RsaPublicComponents::from(&private_key);

        assert_eq!(public_key.n, [100]);
        assert_eq!(public_key.e, [3]);
        assert!(!format!("{:?}", private_key).contains("123"));
    }

    #[test]
    fn ssh_names() {
        for algorithm in [Algorithm::Rsa, Algorithm::Dsa] {
            assert_eq!(
                Algorithm::from_ssh_name(algorithm.ssh_name().as_bytes()),
                Some(algorithm)
            );
        }
        assert_eq!(Algorithm::from_ssh_name(b"ssh-ed25519"), None);
    }
}
