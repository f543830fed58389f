//! The TL `JSONValue` tagged union.

use crate::deserialize::{self, Buffer, Deserializable, Error};
use crate::ids::*;
use crate::serialize::{self, Serializable};

/// A JSON document as TL encodes it.
///
/// Objects keep their keys in wire order.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
    /// `jsonNull`
    Null,
    /// `jsonBool value:Bool`
    Bool(bool),
    /// `jsonNumber value:double`
    Number(f64),
    /// `jsonString value:string`
    String(String),
    /// `jsonArray value:Vector<JSONValue>`
    Array(Vec<JsonValue>),
    /// `jsonObject value:Vector<JSONObjectValue>`
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    /// Encoded size in bytes, leading identifier included.
    pub fn encoded_len(&self) -> usize {
        4 + match self {
            Self::Null => 0,
            Self::Bool(_) => 4,
            Self::Number(_) => 8,
            Self::String(s) => serialize::bytes_len(s.len()),
            Self::Array(items) => 8 + items.iter().map(Self::encoded_len).sum::<usize>(),
            Self::Object(pairs) => {
                8 + pairs
                    .iter()
                    .map(|(k, v)| 4 + serialize::bytes_len(k.len()) + v.encoded_len())
                    .sum::<usize>()
            }
        }
    }
}

impl Serializable for JsonValue {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        match self {
            Self::Null => JSON_NULL_ID.serialize(buf),
            Self::Bool(b) => {
                JSON_BOOL_ID.serialize(buf);
                b.serialize(buf);
            }
            Self::Number(n) => {
                JSON_NUMBER_ID.serialize(buf);
                n.serialize(buf);
            }
            Self::String(s) => {
                JSON_STRING_ID.serialize(buf);
                s.serialize(buf);
            }
            Self::Array(items) => {
                JSON_ARRAY_ID.serialize(buf);
                items.serialize(buf);
            }
            Self::Object(pairs) => {
                JSON_OBJECT_ID.serialize(buf);
                serialize::write_vector_header(pairs.len(), buf);
                for (key, value) in pairs {
                    JSON_OBJECT_VALUE_ID.serialize(buf);
                    key.serialize(buf);
                    value.serialize(buf);
                }
            }
        }
    }
}

impl Deserializable for JsonValue {
    fn deserialize(buf: Buffer) -> deserialize::Result<Self> {
        Ok(match u32::deserialize(buf)? {
            JSON_NULL_ID => Self::Null,
            JSON_BOOL_ID => Self::Bool(bool::deserialize(buf)?),
            JSON_NUMBER_ID => Self::Number(f64::deserialize(buf)?),
            JSON_STRING_ID => Self::String(String::deserialize(buf)?),
            JSON_ARRAY_ID => Self::Array(Vec::<JsonValue>::deserialize(buf)?),
            JSON_OBJECT_ID => {
                deserialize::read_vector_id(buf)?;
                let len = deserialize::read_len(buf)?;
                let mut pairs = Vec::with_capacity(len.min(buf.remaining() / 4));
                for _ in 0..len {
                    match u32::deserialize(buf)? {
                        JSON_OBJECT_VALUE_ID => {}
                        id => return Err(Error::UnexpectedConstructor { id }),
                    }
                    let key = String::deserialize(buf)?;
                    pairs.push((key, JsonValue::deserialize(buf)?));
                }
                Self::Object(pairs)
            }
            id => return Err(Error::UnexpectedConstructor { id }),
        })
    }
}
