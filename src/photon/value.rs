use crate::photon::reader::ByteReader;
use crate::photon::DecodeError;

/// Protocol16 wire type tags.
///
/// These byte values are the wire contract; they match the client's
/// serializer and must not be renumbered.
pub mod tag {
    pub const NULL: u8 = 42;
    pub const DICTIONARY: u8 = 68;
    pub const STRING_ARRAY: u8 = 97;
    pub const BYTE: u8 = 98;
    pub const DOUBLE: u8 = 100;
    pub const FLOAT: u8 = 102;
    pub const HASHTABLE: u8 = 104;
    pub const INTEGER: u8 = 105;
    pub const SHORT: u8 = 107;
    pub const LONG: u8 = 108;
    pub const INT_ARRAY: u8 = 110;
    pub const BOOLEAN: u8 = 111;
    pub const STRING: u8 = 115;
    pub const BYTE_ARRAY: u8 = 120;
    pub const ARRAY: u8 = 121;
    pub const OBJECT_ARRAY: u8 = 122;
}

/// One decoded Protocol16 value.
///
/// Composite shapes that declare an element type on the wire keep that tag
/// so a value re-encodes byte-identically even when empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<u8>),
    IntArray(Vec<i32>),
    StringArray(Vec<String>),
    /// Homogeneous array: one element tag, then the elements
    Array { element_tag: u8, items: Vec<Value> },
    /// Heterogeneous array: every element carries its own tag
    ObjectArray(Vec<Value>),
    /// Key and value tags from the wire header; tag 0 or NULL means the
    /// entries are individually tagged
    Dictionary {
        key_tag: u8,
        value_tag: u8,
        entries: Vec<(Value, Value)>,
    },
    /// Mixed-type map: every key and value carries its own tag
    Hashtable(Vec<(Value, Value)>),
}

impl Value {
    /// The wire tag this value serializes under.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Null => tag::NULL,
            Value::Bool(_) => tag::BOOLEAN,
            Value::Byte(_) => tag::BYTE,
            Value::Short(_) => tag::SHORT,
            Value::Int(_) => tag::INTEGER,
            Value::Long(_) => tag::LONG,
            Value::Float(_) => tag::FLOAT,
            Value::Double(_) => tag::DOUBLE,
            Value::String(_) => tag::STRING,
            Value::ByteArray(_) => tag::BYTE_ARRAY,
            Value::IntArray(_) => tag::INT_ARRAY,
            Value::StringArray(_) => tag::STRING_ARRAY,
            Value::Array { .. } => tag::ARRAY,
            Value::ObjectArray(_) => tag::OBJECT_ARRAY,
            Value::Dictionary { .. } => tag::DICTIONARY,
            Value::Hashtable(_) => tag::HASHTABLE,
        }
    }
}

/// Decodes one tag-prefixed value from the reader.
pub fn decode_value(reader: &mut ByteReader<'_>) -> Result<Value, DecodeError> {
    let tag_byte = reader.read_u8()?;
    decode_tagged(reader, tag_byte)
}

/// Decodes the body of a value whose tag was already consumed.
pub fn decode_tagged(reader: &mut ByteReader<'_>, tag_byte: u8) -> Result<Value, DecodeError> {
    match tag_byte {
        tag::NULL => Ok(Value::Null),
        tag::BOOLEAN => Ok(Value::Bool(reader.read_u8()? != 0)),
        tag::BYTE => Ok(Value::Byte(reader.read_u8()?)),
        tag::SHORT => Ok(Value::Short(reader.read_i16()?)),
        tag::INTEGER => Ok(Value::Int(reader.read_i32()?)),
        tag::LONG => Ok(Value::Long(reader.read_i64()?)),
        tag::FLOAT => Ok(Value::Float(reader.read_f32()?)),
        tag::DOUBLE => Ok(Value::Double(reader.read_f64()?)),
        tag::STRING => decode_string(reader).map(Value::String),
        tag::BYTE_ARRAY => {
            let count = reader.read_u32()? as usize;
            Ok(Value::ByteArray(reader.read_bytes(count)?.to_vec()))
        }
        tag::INT_ARRAY => {
            let count = reader.read_u32()? as usize;
            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                items.push(reader.read_i32()?);
            }
            Ok(Value::IntArray(items))
        }
        tag::STRING_ARRAY => {
            let count = reader.read_u16()? as usize;
            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                items.push(decode_string(reader)?);
            }
            Ok(Value::StringArray(items))
        }
        tag::ARRAY => {
            let count = reader.read_u16()? as usize;
            let element_tag = reader.read_u8()?;
            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                items.push(decode_tagged(reader, element_tag)?);
            }
            Ok(Value::Array { element_tag, items })
        }
        tag::OBJECT_ARRAY => {
            let count = reader.read_u16()? as usize;
            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                items.push(decode_value(reader)?);
            }
            Ok(Value::ObjectArray(items))
        }
        tag::DICTIONARY => {
            let key_tag = reader.read_u8()?;
            let value_tag = reader.read_u8()?;
            let count = reader.read_u16()? as usize;
            let mut entries = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                let key = decode_dictionary_slot(reader, key_tag)?;
                let value = decode_dictionary_slot(reader, value_tag)?;
                entries.push((key, value));
            }
            Ok(Value::Dictionary {
                key_tag,
                value_tag,
                entries,
            })
        }
        tag::HASHTABLE => {
            let count = reader.read_u16()? as usize;
            let mut entries = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                let key = decode_value(reader)?;
                let value = decode_value(reader)?;
                entries.push((key, value));
            }
            Ok(Value::Hashtable(entries))
        }
        other => Err(DecodeError::UnknownTag { tag: other }),
    }
}

// Declared counts come straight off the wire; cap the pre-allocation so a
// hostile length field cannot balloon memory before the bounds check trips.
const MAX_PREALLOC: usize = 1024;

fn decode_string(reader: &mut ByteReader<'_>) -> Result<String, DecodeError> {
    let len = reader.read_u16()? as usize;
    let bytes = reader.read_bytes(len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

// A dictionary header tag of 0 or NULL means each slot is self-tagged.
fn decode_dictionary_slot(
    reader: &mut ByteReader<'_>,
    declared_tag: u8,
) -> Result<Value, DecodeError> {
    if declared_tag == 0 || declared_tag == tag::NULL {
        decode_value(reader)
    } else {
        decode_tagged(reader, declared_tag)
    }
}

/// Encodes a value with its leading tag byte.
///
/// The inverse of [`decode_value`]; used by the synthetic-frame test
/// helpers and debugging tools.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) {
    out.push(value.tag());
    encode_body(value, out);
}

fn encode_body(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push(u8::from(*b)),
        Value::Byte(b) => out.push(*b),
        Value::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::String(s) => encode_string(s, out),
        Value::ByteArray(bytes) => {
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        Value::IntArray(items) => {
            out.extend_from_slice(&(items.len() as u32).to_be_bytes());
            for item in items {
                out.extend_from_slice(&item.to_be_bytes());
            }
        }
        Value::StringArray(items) => {
            out.extend_from_slice(&(items.len() as u16).to_be_bytes());
            for item in items {
                encode_string(item, out);
            }
        }
        Value::Array { element_tag, items } => {
            out.extend_from_slice(&(items.len() as u16).to_be_bytes());
            out.push(*element_tag);
            for item in items {
                encode_body(item, out);
            }
        }
        Value::ObjectArray(items) => {
            out.extend_from_slice(&(items.len() as u16).to_be_bytes());
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Dictionary {
            key_tag,
            value_tag,
            entries,
        } => {
            out.push(*key_tag);
            out.push(*value_tag);
            out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
            for (key, value) in entries {
                encode_dictionary_slot(key, *key_tag, out);
                encode_dictionary_slot(value, *value_tag, out);
            }
        }
        Value::Hashtable(entries) => {
            out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
            for (key, value) in entries {
                encode_value(key, out);
                encode_value(value, out);
            }
        }
    }
}

fn encode_string(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn encode_dictionary_slot(value: &Value, declared_tag: u8, out: &mut Vec<u8>) {
    if declared_tag == 0 || declared_tag == tag::NULL {
        encode_value(value, out);
    } else {
        encode_body(value, out);
    }
}
