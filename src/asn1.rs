//! Schema-driven DER codec for the PKCS#1 RSA and OpenSSL-style DSA structures.
//!
//! Every structure is described once, as a static table of [`Field`]
//! descriptors, and a single generic encoder/decoder walks those tables. The
//! typed structs in this module only say which values go into which
//! positions; none of them parse bytes themselves.
//!
//! ```text
//! RSAPrivateKey ::= SEQUENCE { version, n, e, d, p, q, e1, e2, coeff }
//! RSAPublicKey  ::= SEQUENCE { n, e }
//! DSAPrivateKey ::= SEQUENCE { version, p, q, g, y, x }
//! DSAPublicKey  ::= SEQUENCE { SEQUENCE { id-dsa, SEQUENCE { p, q, g } }, BIT STRING }
//! Dss-Sig-Value ::= SEQUENCE { r, s }
//! ```

mod codec;
mod keys;
mod schema;

pub use self::{
    codec::{decode, encode, encode_integer, integer_bytes, Fields},
    keys::{
        DsaAlgorithm, DsaParameters, DsaPrivateKey, DsaPublicKey, DsaSignature, RsaPrivateKey,
        RsaPublicKey, ID_DSA,
    },
    schema::{Asn1Struct, Field, Kind, Schema, Value},
};
