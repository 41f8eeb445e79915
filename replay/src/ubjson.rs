//! A minimal UBJSON reader covering the subset Slippi writes into the
//! trailing `metadata` element: objects, arrays, strings, integers up to
//! 64 bits, floats, booleans, and null.
//!
//! Values land in a `serde_json::Value` so callers get tolerant, schemaless
//! access plus a raw representation they can stash for forward compatibility.

use serde_json::{Map, Number, Value};

use crate::errors::ReplayError;
use crate::reader::Reader;

pub(crate) fn parse_value(reader: &mut Reader<'_>) -> Result<Value, ReplayError> {
    let offset = reader.offset();
    let marker = reader.u8()?;
    parse_tagged(reader, marker, offset)
}

fn parse_tagged(reader: &mut Reader<'_>, marker: u8, offset: usize) -> Result<Value, ReplayError> {
    match marker {
        b'Z' => Ok(Value::Null),
        b'T' => Ok(Value::Bool(true)),
        b'F' => Ok(Value::Bool(false)),
        b'i' => Ok(Value::from(reader.i8()? as i64)),
        b'U' => Ok(Value::from(reader.u8()? as i64)),
        b'I' => {
            let b = reader.take(2)?;
            Ok(Value::from(i16::from_be_bytes([b[0], b[1]]) as i64))
        },
        b'l' => Ok(Value::from(reader.i32()? as i64)),
        b'L' => {
            let b = reader.take(8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            Ok(Value::from(i64::from_be_bytes(raw)))
        },
        b'd' => Ok(number_from_f64(reader.f32()? as f64)),
        b'D' => {
            let b = reader.take(8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            Ok(number_from_f64(f64::from_be_bytes(raw)))
        },
        b'S' => Ok(Value::String(parse_string(reader)?)),
        b'{' => parse_object(reader),
        b'[' => parse_array(reader),
        other => Err(ReplayError::malformed(
            offset,
            format!("unsupported ubjson type marker 0x{other:02x}"),
        )),
    }
}

/// A length-prefixed string body: one numeric value for the byte count,
/// then that many UTF-8 bytes. Object keys use the same encoding without
/// a leading `S` marker.
fn parse_string(reader: &mut Reader<'_>) -> Result<String, ReplayError> {
    let offset = reader.offset();
    let len = parse_length(reader)?;
    let bytes = reader.take(len)?;

    String::from_utf8(bytes.to_vec())
        .map_err(|_| ReplayError::malformed(offset, "ubjson string is not valid utf-8"))
}

fn parse_length(reader: &mut Reader<'_>) -> Result<usize, ReplayError> {
    let offset = reader.offset();
    let marker = reader.u8()?;

    let len: i64 = match marker {
        b'i' => reader.i8()? as i64,
        b'U' => reader.u8()? as i64,
        b'I' => {
            let b = reader.take(2)?;
            i16::from_be_bytes([b[0], b[1]]) as i64
        },
        b'l' => reader.i32()? as i64,
        b'L' => {
            let b = reader.take(8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            i64::from_be_bytes(raw)
        },
        other => {
            return Err(ReplayError::malformed(
                offset,
                format!("expected a ubjson length, but got marker 0x{other:02x}"),
            ))
        },
    };

    usize::try_from(len).map_err(|_| ReplayError::malformed(offset, "negative ubjson length"))
}

fn parse_object(reader: &mut Reader<'_>) -> Result<Value, ReplayError> {
    let mut map = Map::new();

    loop {
        let offset = reader.offset();
        let marker = reader.u8()?;
        if marker == b'}' {
            return Ok(Value::Object(map));
        }

        // The marker we just consumed starts the key's length value.
        let key = {
            let len_offset = offset;
            let len: i64 = match marker {
                b'i' => reader.i8()? as i64,
                b'U' => reader.u8()? as i64,
                b'I' => {
                    let b = reader.take(2)?;
                    i16::from_be_bytes([b[0], b[1]]) as i64
                },
                b'l' => reader.i32()? as i64,
                other => {
                    return Err(ReplayError::malformed(
                        len_offset,
                        format!("expected a ubjson key, but got marker 0x{other:02x}"),
                    ))
                },
            };
            let len = usize::try_from(len)
                .map_err(|_| ReplayError::malformed(len_offset, "negative ubjson key length"))?;
            let bytes = reader.take(len)?;
            String::from_utf8(bytes.to_vec())
                .map_err(|_| ReplayError::malformed(len_offset, "ubjson key is not valid utf-8"))?
        };

        let value = parse_value(reader)?;
        map.insert(key, value);
    }
}

fn parse_array(reader: &mut Reader<'_>) -> Result<Value, ReplayError> {
    let mut items = Vec::new();

    loop {
        let offset = reader.offset();
        let marker = reader.u8()?;
        if marker == b']' {
            return Ok(Value::Array(items));
        }
        items.push(parse_tagged(reader, marker, offset)?);
    }
}

fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
