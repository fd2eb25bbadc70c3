//! Typed views of the supported structures.

use core::fmt;

use const_oid::ObjectIdentifier;

use super::codec::{self, Fields};
use super::schema::{Asn1Struct, Field, Schema, Value};
use crate::errors::{Error, Result};

/// `id-dsa` object identifier (RFC 3279).
pub const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");

const DSA_PARAMETERS: &[Field] = &[
    Field::integer("p"),
    Field::integer("q"),
    Field::integer("g"),
];

const DSA_ALGORITHM: &[Field] = &[
    Field::object_identifier("algorithm"),
    Field::sequence("parameters", DSA_PARAMETERS),
];

/// PKCS#1 `RSAPrivateKey`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct RsaPrivateKey<'a> {
    /// Structure version, `0` for two-prime keys.
    pub version: &'a [u8],
    /// `n`
    pub modulus: &'a [u8],
    /// `e`
    pub public_exponent: &'a [u8],
    /// `d`
    pub private_exponent: &'a [u8],
    /// `p`
    pub prime1: &'a [u8],
    /// `q`
    pub prime2: &'a [u8],
    /// `d mod (p-1)`
    pub exponent1: &'a [u8],
    /// `d mod (q-1)`
    pub exponent2: &'a [u8],
    /// `(inverse of q) mod p`
    pub coefficient: &'a [u8],
}

impl<'a> RsaPrivateKey<'a> {
    /// Version number of a two-prime key.
    pub const VERSION: &'static [u8] = &[0];

    /// The public half of this key.
    pub fn public_key(&self) -> RsaPublicKey<'a> {
        RsaPublicKey {
            modulus: self.modulus,
            public_exponent: self.public_exponent,
        }
    }
}

impl<'a> Asn1Struct<'a> for RsaPrivateKey<'a> {
    const SCHEMA: Schema = Schema {
        name: "RSAPrivateKey",
        fields: &[
            Field::integer("version"),
            Field::integer("modulus"),
            Field::integer("publicExponent"),
            Field::integer("privateExponent"),
            Field::integer("prime1"),
            Field::integer("prime2"),
            Field::integer("exponent1"),
            Field::integer("exponent2"),
            Field::integer("coefficient"),
        ],
    };

    fn values(&self) -> Vec<Value<'a>> {
        [
            self.version,
            self.modulus,
            self.public_exponent,
            self.private_exponent,
            self.prime1,
            self.prime2,
            self.exponent1,
            self.exponent2,
            self.coefficient,
        ]
        .into_iter()
        .map(Value::Integer)
        .collect()
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            version: fields.integer()?,
            modulus: fields.integer()?,
            public_exponent: fields.integer()?,
            private_exponent: fields.integer()?,
            prime1: fields.integer()?,
            prime2: fields.integer()?,
            exponent1: fields.integer()?,
            exponent2: fields.integer()?,
            coefficient: fields.integer()?,
        })
    }
}

impl fmt::Debug for RsaPrivateKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("modulus", &self.modulus)
            .field("public_exponent", &self.public_exponent)
            .finish_non_exhaustive()
    }
}

/// PKCS#1 `RSAPublicKey`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RsaPublicKey<'a> {
    /// `n`
    pub modulus: &'a [u8],
    /// `e`
    pub public_exponent: &'a [u8],
}

impl<'a> Asn1Struct<'a> for RsaPublicKey<'a> {
    const SCHEMA: Schema = Schema {
        name: "RSAPublicKey",
        fields: &[Field::integer("modulus"), Field::integer("publicExponent")],
    };

    fn values(&self) -> Vec<Value<'a>> {
        vec![
            Value::Integer(self.modulus),
            Value::Integer(self.public_exponent),
        ]
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            modulus: fields.integer()?,
            public_exponent: fields.integer()?,
        })
    }
}

/// `Dss-Parms`: the DSA domain parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DsaParameters<'a> {
    /// `p`
    pub p: &'a [u8],
    /// `q`
    pub q: &'a [u8],
    /// `g`
    pub g: &'a [u8],
}

impl<'a> DsaParameters<'a> {
    fn push_values(&self, values: &mut Vec<Value<'a>>) {
        values.extend([self.p, self.q, self.g].into_iter().map(Value::Integer));
    }

    fn read(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            p: fields.integer()?,
            q: fields.integer()?,
            g: fields.integer()?,
        })
    }
}

impl<'a> Asn1Struct<'a> for DsaParameters<'a> {
    const SCHEMA: Schema = Schema {
        name: "Dss-Parms",
        fields: DSA_PARAMETERS,
    };

    fn values(&self) -> Vec<Value<'a>> {
        let mut values = Vec::with_capacity(3);
        self.push_values(&mut values);
        values
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Self::read(fields)
    }
}

/// OpenSSL's traditional `DSAPrivateKey` layout.
///
/// The domain parameters are stored inline, not as a nested sequence.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct DsaPrivateKey<'a> {
    /// Structure version, always `0`.
    pub version: &'a [u8],
    /// Domain parameters.
    pub params: DsaParameters<'a>,
    /// `y`
    pub public_key: &'a [u8],
    /// `x`
    pub private_key: &'a [u8],
}

impl<'a> DsaPrivateKey<'a> {
    /// Version number written by OpenSSL.
    pub const VERSION: &'static [u8] = &[0];
}

impl<'a> Asn1Struct<'a> for DsaPrivateKey<'a> {
    const SCHEMA: Schema = Schema {
        name: "DSAPrivateKey",
        fields: &[
            Field::integer("version"),
            Field::integer("p"),
            Field::integer("q"),
            Field::integer("g"),
            Field::integer("pub"),
            Field::integer("priv"),
        ],
    };

    fn values(&self) -> Vec<Value<'a>> {
        let mut values = Vec::with_capacity(6);
        values.push(Value::Integer(self.version));
        self.params.push_values(&mut values);
        values.push(Value::Integer(self.public_key));
        values.push(Value::Integer(self.private_key));
        values
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            version: fields.integer()?,
            params: DsaParameters::read(fields)?,
            public_key: fields.integer()?,
            private_key: fields.integer()?,
        })
    }
}

impl fmt::Debug for DsaPrivateKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsaPrivateKey")
            .field("params", &self.params)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// `AlgorithmIdentifier` for DSA with explicit parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DsaAlgorithm<'a> {
    /// Algorithm OID, [`ID_DSA`] for keys produced by this crate.
    pub oid: ObjectIdentifier,
    /// Domain parameters.
    pub params: DsaParameters<'a>,
}

impl<'a> Asn1Struct<'a> for DsaAlgorithm<'a> {
    const SCHEMA: Schema = Schema {
        name: "AlgorithmIdentifier",
        fields: DSA_ALGORITHM,
    };

    fn values(&self) -> Vec<Value<'a>> {
        let mut values = vec![Value::ObjectIdentifier(self.oid)];
        self.params.push_values(&mut values);
        values
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            oid: fields.object_identifier()?,
            params: DsaParameters::read(fields)?,
        })
    }
}

/// `SubjectPublicKeyInfo` for a DSA key.
///
/// The bit string holds `y` as a DER `INTEGER`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DsaPublicKey<'a> {
    /// Algorithm and domain parameters.
    pub algorithm: DsaAlgorithm<'a>,
    /// Contents of the `subjectPublicKey` bit string.
    pub subject_public_key: &'a [u8],
}

impl<'a> DsaPublicKey<'a> {
    /// The public value `y`, unwrapped from the bit string.
    pub fn y(&self) -> Result<&'a [u8]> {
        codec::integer_bytes(self.subject_public_key)
    }

    /// Encode `y` the way it is carried inside the bit string.
    pub fn encode_y(y: &[u8]) -> Result<Vec<u8>> {
        codec::encode_integer(y)
    }
}

impl<'a> Asn1Struct<'a> for DsaPublicKey<'a> {
    const SCHEMA: Schema = Schema {
        name: "SubjectPublicKeyInfo",
        fields: &[
            Field::sequence("algorithm", DSA_ALGORITHM),
            Field::bit_string("subjectPublicKey"),
        ],
    };

    fn values(&self) -> Vec<Value<'a>> {
        let mut values = self.algorithm.values();
        values.push(Value::BitString(self.subject_public_key));
        values
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        let algorithm = DsaAlgorithm::from_fields(fields)?;
        if algorithm.oid != ID_DSA {
            log::debug!("public key algorithm {} is not id-dsa", algorithm.oid);
            return Err(Error::UnsupportedAlgorithm);
        }

        Ok(Self {
            algorithm,
            subject_public_key: fields.bit_string()?,
        })
    }
}

/// `Dss-Sig-Value`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DsaSignature<'a> {
    /// `r`
    pub r: &'a [u8],
    /// `s`
    pub s: &'a [u8],
}

impl<'a> Asn1Struct<'a> for DsaSignature<'a> {
    const SCHEMA: Schema = Schema {
        name: "Dss-Sig-Value",
        fields: &[Field::integer("r"), Field::integer("s")],
    };

    fn values(&self) -> Vec<Value<'a>> {
        vec![Value::Integer(self.r), Value::Integer(self.s)]
    }

    fn from_fields(fields: &mut Fields<'a>) -> Result<Self> {
        Ok(Self {
            r: fields.integer()?,
            s: fields.integer()?,
        })
    }
}
