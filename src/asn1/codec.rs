use const_oid::ObjectIdentifier;
use der::{Decode, Encode, Header, Reader, SliceReader, Tag};

use super::schema::{Asn1Struct, Field, Kind, Schema, Value};
use crate::errors::{Error, Result};

/// Encode `value` as DER using its schema.
///
/// Integers are written as minimal non-negative two's complement: redundant
/// leading zero bytes are dropped and a single `0x00` is prepended whenever
/// the most significant bit of the first content byte is set.
pub fn encode<'a, T: Asn1Struct<'a>>(value: &T) -> Result<Vec<u8>> {
    let schema = T::SCHEMA;
    let values = value.values();
    if values.len() != schema.leaf_count() {
        log::debug!(
            "{}: {} values supplied for {} fields",
            schema.name,
            values.len(),
            schema.leaf_count()
        );
        return Err(Error::Encode(Tag::Sequence.length_error()));
    }

    let mut values = values.into_iter();
    let mut body = Vec::new();
    encode_fields(schema.fields, &mut values, &mut body).map_err(Error::Encode)?;

    let mut out = Vec::with_capacity(body.len() + 4);
    write_tlv(&mut out, Tag::Sequence, &body).map_err(Error::Encode)?;
    Ok(out)
}

/// Decode DER `bytes` into `T`, strictly following its schema.
///
/// Decoded integers borrow from `bytes` with the sign-avoidance `0x00`
/// removed; copy them out if they must outlive the input.
pub fn decode<'a, T: Asn1Struct<'a>>(bytes: &'a [u8]) -> Result<T> {
    let values = decode_values(&T::SCHEMA, bytes).map_err(Error::Decode)?;
    let mut fields = Fields {
        values: values.into_iter(),
    };
    T::from_fields(&mut fields)
}

/// Encode a standalone `INTEGER` (tag, length and content).
pub fn encode_integer(magnitude: &[u8]) -> Result<Vec<u8>> {
    let content = integer_content(magnitude);
    let mut out = Vec::with_capacity(content.len() + 4);
    write_tlv(&mut out, Tag::Integer, &content).map_err(Error::Encode)?;
    Ok(out)
}

/// Decode a standalone `INTEGER` and return its unsigned magnitude.
pub fn integer_bytes(bytes: &[u8]) -> Result<&[u8]> {
    fn read(bytes: &[u8]) -> der::Result<&[u8]> {
        let mut reader = SliceReader::new(bytes)?;
        let content = read_tlv(&mut reader, Tag::Integer)?;
        let magnitude = integer_magnitude(content)?;
        reader.finish(magnitude)
    }

    read(bytes).map_err(Error::Decode)
}

/// Decoded leaf values, handed out in schema order.
#[derive(Debug)]
pub struct Fields<'a> {
    values: std::vec::IntoIter<Value<'a>>,
}

impl<'a> Fields<'a> {
    /// Next value, which must be an `INTEGER`.
    pub fn integer(&mut self) -> Result<&'a [u8]> {
        match self.next(Tag::Integer)? {
            Value::Integer(bytes) => Ok(bytes),
            other => Err(unexpected(other, Tag::Integer)),
        }
    }

    /// Next value, which must be a `BIT STRING`.
    pub fn bit_string(&mut self) -> Result<&'a [u8]> {
        match self.next(Tag::BitString)? {
            Value::BitString(bytes) => Ok(bytes),
            other => Err(unexpected(other, Tag::BitString)),
        }
    }

    /// Next value, which must be an `OBJECT IDENTIFIER`.
    pub fn object_identifier(&mut self) -> Result<ObjectIdentifier> {
        match self.next(Tag::ObjectIdentifier)? {
            Value::ObjectIdentifier(oid) => Ok(oid),
            other => Err(unexpected(other, Tag::ObjectIdentifier)),
        }
    }

    fn next(&mut self, expected: Tag) -> Result<Value<'a>> {
        self.values
            .next()
            .ok_or_else(|| Error::Decode(expected.length_error()))
    }
}

fn unexpected(value: Value<'_>, expected: Tag) -> Error {
    log::debug!("expected {}, found {}", expected, value.kind_name());
    Error::Decode(value_tag(&value).unexpected_error(Some(expected)))
}

fn value_tag(value: &Value<'_>) -> Tag {
    match value {
        Value::Integer(_) => Tag::Integer,
        Value::BitString(_) => Tag::BitString,
        Value::ObjectIdentifier(_) => Tag::ObjectIdentifier,
    }
}

fn encode_fields<'a>(
    fields: &[Field],
    values: &mut impl Iterator<Item = Value<'a>>,
    out: &mut Vec<u8>,
) -> der::Result<()> {
    for field in fields {
        if let Kind::Sequence(inner) = field.kind {
            let mut body = Vec::new();
            encode_fields(inner, values, &mut body)?;
            write_tlv(out, Tag::Sequence, &body)?;
            continue;
        }

        let value = values
            .next()
            .ok_or_else(|| Tag::Sequence.length_error())?;

        match (field.kind, value) {
            (Kind::Integer, Value::Integer(bytes)) => {
                write_tlv(out, Tag::Integer, &integer_content(bytes))?
            }
            (Kind::BitString, Value::BitString(bytes)) => {
                let mut content = Vec::with_capacity(bytes.len() + 1);
                // no unused bits
                content.push(0);
                content.extend_from_slice(bytes);
                write_tlv(out, Tag::BitString, &content)?
            }
            (Kind::ObjectIdentifier, Value::ObjectIdentifier(oid)) => {
                write_tlv(out, Tag::ObjectIdentifier, oid.as_bytes())?
            }
            (_, other) => {
                log::debug!("field `{}` cannot hold {}", field.name, other.kind_name());
                return Err(value_tag(&other).value_error());
            }
        }
    }

    Ok(())
}

fn write_tlv(out: &mut Vec<u8>, tag: Tag, content: &[u8]) -> der::Result<()> {
    Header::new(tag, content.len())?.encode_to_vec(out)?;
    out.extend_from_slice(content);
    Ok(())
}

fn integer_content(magnitude: &[u8]) -> Vec<u8> {
    let start = magnitude
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(magnitude.len());
    let magnitude = &magnitude[start..];

    let mut content = Vec::with_capacity(magnitude.len() + 1);
    match magnitude.first() {
        Some(first) if first & 0x80 == 0 => {}
        _ => content.push(0),
    }
    content.extend_from_slice(magnitude);
    content
}

fn decode_values<'a>(schema: &Schema, bytes: &'a [u8]) -> der::Result<Vec<Value<'a>>> {
    let mut reader = SliceReader::new(bytes)?;
    let body = read_tlv(&mut reader, Tag::Sequence)?;

    let mut values = Vec::with_capacity(schema.leaf_count());
    decode_fields(schema.fields, body, &mut values)?;
    reader.finish(values)
}

fn decode_fields<'a>(
    fields: &[Field],
    body: &'a [u8],
    values: &mut Vec<Value<'a>>,
) -> der::Result<()> {
    let mut reader = SliceReader::new(body)?;

    for field in fields {
        match field.kind {
            Kind::Sequence(inner) => {
                let body = read_tlv(&mut reader, Tag::Sequence)?;
                decode_fields(inner, body, values)?;
            }
            Kind::Integer => {
                let content = read_tlv(&mut reader, Tag::Integer)?;
                values.push(Value::Integer(integer_magnitude(content)?));
            }
            Kind::BitString => match read_tlv(&mut reader, Tag::BitString)?.split_first() {
                Some((&0, rest)) => values.push(Value::BitString(rest)),
                _ => return Err(Tag::BitString.value_error()),
            },
            Kind::ObjectIdentifier => {
                let content = read_tlv(&mut reader, Tag::ObjectIdentifier)?;
                let oid = ObjectIdentifier::from_bytes(content)
                    .map_err(|_| Tag::ObjectIdentifier.value_error())?;
                values.push(Value::ObjectIdentifier(oid));
            }
        }
    }

    reader.finish(())
}

fn read_tlv<'a>(reader: &mut SliceReader<'a>, tag: Tag) -> der::Result<&'a [u8]> {
    let header = Header::decode(reader)?;
    header.tag.assert_eq(tag)?;
    reader.read_slice(header.length)
}

fn integer_magnitude(content: &[u8]) -> der::Result<&[u8]> {
    match content {
        [] => Err(Tag::Integer.length_error()),
        [0] => Ok(content),
        [0, next, ..] if next & 0x80 == 0 => Err(Tag::Integer.non_canonical_error()),
        [0, rest @ ..] => Ok(rest),
        [first, ..] if first & 0x80 != 0 => Err(Tag::Integer.value_error()),
        _ => Ok(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::{DsaSignature, RsaPublicKey};
    use hex_literal::hex;

    #[test]
    fn encode_inserts_sign_byte() {
        let key = RsaPublicKey {
            modulus: &hex!("8001"),
            public_exponent: &hex!("010001"),
        };
        assert_eq!(
            encode(&key).unwrap(),
            hex!("300a 0203 008001 0203 010001")
        );
    }

    #[test]
    fn encode_strips_redundant_zeros() {
        assert_eq!(encode_integer(&hex!("000005")).unwrap(), hex!("020105"));
        assert_eq!(encode_integer(&hex!("0000")).unwrap(), hex!("020100"));
        assert_eq!(encode_integer(&[]).unwrap(), hex!("020100"));
        assert_eq!(encode_integer(&hex!("00ff")).unwrap(), hex!("020200ff"));
    }

    #[test]
    fn decode_strips_sign_byte() {
        let key: RsaPublicKey<'_> = decode(&hex!("300a 0203 008001 0203 010001")).unwrap();
        assert_eq!(key.modulus, hex!("8001"));
        assert_eq!(key.public_exponent, hex!("010001"));
    }

    #[test]
    fn decode_rejects_malformed_input() {
        // negative integer
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3006 020180 020103")).is_err());
        // non-minimal integer
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3007 02020001 020103")).is_err());
        // truncated
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3006 020101 0201")).is_err());
        // trailing data inside and after the sequence
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3009 020101 020103 020101")).is_err());
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3006 020101 020103 00")).is_err());
        // wrong tag
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3106 020101 020103")).is_err());
        assert!(decode::<RsaPublicKey<'_>>(&hex!("3006 040101 020103")).is_err());
    }

    #[test]
    fn signature_with_high_bit_round_trips() {
        let r = hex!("80112233445566778899aabbccddeeff00112233");
        let s = hex!("ff0102030405060708090a0b0c0d0e0f10111213");
        let der = encode(&DsaSignature { r: &r, s: &s }).unwrap();
        assert_eq!(&der[..4], &hex!("302e 0215"));

        let decoded: DsaSignature<'_> = decode(&der).unwrap();
        assert_eq!(decoded.r, r);
        assert_eq!(decoded.s, s);
    }

    #[test]
    fn standalone_integer() {
        let der = encode_integer(&hex!("c0ffee")).unwrap();
        assert_eq!(der, hex!("020400c0ffee"));
        assert_eq!(integer_bytes(&der).unwrap(), hex!("c0ffee"));
        assert!(integer_bytes(&hex!("020400c0ffee00")).is_err());
    }
}
