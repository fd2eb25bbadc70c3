use const_oid::ObjectIdentifier;

use crate::errors::Result;

/// The kind of a single schema entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Non-negative `INTEGER`, carried as unsigned big-endian bytes.
    Integer,

    /// `BIT STRING` with no unused bits.
    BitString,

    /// `OBJECT IDENTIFIER`.
    ObjectIdentifier,

    /// Nested `SEQUENCE` described by a sub-schema.
    Sequence(&'static [Field]),
}

/// One entry of a schema.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    /// Field name, used in diagnostics.
    pub name: &'static str,

    /// What the field holds.
    pub kind: Kind,
}

impl Field {
    /// `INTEGER` field.
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Integer,
        }
    }

    /// `BIT STRING` field.
    pub const fn bit_string(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::BitString,
        }
    }

    /// `OBJECT IDENTIFIER` field.
    pub const fn object_identifier(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::ObjectIdentifier,
        }
    }

    /// Nested `SEQUENCE` field.
    pub const fn sequence(name: &'static str, fields: &'static [Field]) -> Self {
        Self {
            name,
            kind: Kind::Sequence(fields),
        }
    }
}

/// A complete structure: an outer `SEQUENCE` and its fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Schema {
    /// ASN.1 type name.
    pub name: &'static str,

    /// Fields of the outer `SEQUENCE`, in order.
    pub fields: &'static [Field],
}

impl Schema {
    /// Number of leaf values (everything except nested sequences).
    pub fn leaf_count(&self) -> usize {
        count_leaves(self.fields)
    }
}

fn count_leaves(fields: &[Field]) -> usize {
    fields
        .iter()
        .map(|field| match field.kind {
            Kind::Sequence(inner) => count_leaves(inner),
            _ => 1,
        })
        .sum()
}

/// A leaf value, borrowed from the caller (encode) or from the DER input (decode).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Value<'a> {
    /// Unsigned big-endian integer magnitude.
    Integer(&'a [u8]),

    /// Bit string contents.
    BitString(&'a [u8]),

    /// Object identifier.
    ObjectIdentifier(ObjectIdentifier),
}

impl Value<'_> {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::BitString(_) => "BIT STRING",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
        }
    }
}

/// A typed structure bound to a static [`Schema`].
///
/// Leaf values are exchanged in schema order: nested sequences are walked
/// depth first, so a struct that groups `p`, `q`, `g` into a sub-struct still
/// hands them over as three consecutive integers.
pub trait Asn1Struct<'a>: Sized {
    /// The schema this structure is encoded with.
    const SCHEMA: Schema;

    /// Leaf values in schema order.
    fn values(&self) -> Vec<Value<'a>>;

    /// Rebuild the structure from decoded leaf values.
    fn from_fields(fields: &mut super::Fields<'a>) -> Result<Self>;
}
