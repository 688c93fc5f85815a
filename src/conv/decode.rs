//! Decoder
//!
//! Recursive descent over a [`TokenSource`], driven entirely by a
//! [`Definition`]. A structure is read as a field count followed by that
//! many `(field id, value)` pairs; declared fields that do not occur are
//! then back-filled with null or with their zero default.

use std::cmp::min;

use tracing::{debug, trace};

use super::MAX_DEPTH;
use crate::error::{DecodeError, DecodeResult, WidthError};
use crate::schema::{Definition, FieldDescriptor, Kind};
use crate::token::TokenSource;
use crate::value::{Record, Value};

/// Reads one structure from `source`, consuming exactly its tokens
pub fn decode_structure<S>(source: &mut S, definition: &Definition) -> DecodeResult<Record>
where
    S: TokenSource + ?Sized,
{
    read_structure(source, definition, 0)
}

/// Reads one value of the type described by `descriptor`
///
/// Presence prefixes are only read for the elements of a list; a nullable
/// field that occurs at all is carried as its bare value.
pub fn decode_type<S>(
    source: &mut S,
    definition: &Definition,
    descriptor: &FieldDescriptor,
) -> DecodeResult<Value>
where
    S: TokenSource + ?Sized,
{
    read_type(source, definition, descriptor, 0)
}

fn read_structure<S>(source: &mut S, definition: &Definition, depth: usize) -> DecodeResult<Record>
where
    S: TokenSource + ?Sized,
{
    if depth >= MAX_DEPTH {
        return Err(DecodeError::DepthExceeded { limit: MAX_DEPTH });
    }
    let count = source.take_count()?;
    trace!(structure = definition.name(), count, depth, "reading structure");

    let mut slots: Vec<Option<Value>> = (0..definition.len()).map(|_| None).collect();
    for _ in 0..count {
        let id = source.take_field_id()?;
        let ix = definition.position(id)?;
        let (name, descriptor) = &definition.get_fields()[ix];
        if slots[ix].is_some() {
            return Err(DecodeError::DuplicateField {
                structure: definition.name(),
                id,
            });
        }
        trace!(structure = definition.name(), field = name, id, "reading field");
        slots[ix] = Some(read_type(source, definition, descriptor, depth)?);
    }

    let mut record = Record::with_capacity(definition.len());
    for ((name, descriptor), slot) in definition.get_fields().iter().zip(slots) {
        let value = match slot {
            Some(value) => value,
            None if descriptor.nullable => {
                debug!(structure = definition.name(), field = name, "populating null");
                Value::Null
            }
            None => match descriptor.zero_default() {
                Some(value) => {
                    debug!(structure = definition.name(), field = name, "populating default");
                    value
                }
                None => {
                    return Err(DecodeError::MissingField {
                        structure: definition.name(),
                        field: name,
                    })
                }
            },
        };
        record.insert(*name, value);
    }
    Ok(record)
}

fn check_width(descriptor: &FieldDescriptor, actual: usize) -> DecodeResult<()> {
    match descriptor.fixed_length {
        Some(exact) if exact != actual => Err(WidthError::WrongWidth { exact, actual }.into()),
        _ => Ok(()),
    }
}

fn read_float<S, const N: usize>(source: &mut S) -> DecodeResult<[u8; N]>
where
    S: TokenSource + ?Sized,
{
    let payload = source.next_token()?.payload()?;
    payload
        .try_into()
        .map_err(|_| DecodeError::InvalidFloatLength {
            expected: N,
            actual: payload.len(),
        })
}

fn read_type<S>(
    source: &mut S,
    definition: &Definition,
    descriptor: &FieldDescriptor,
    depth: usize,
) -> DecodeResult<Value>
where
    S: TokenSource + ?Sized,
{
    match &descriptor.kind {
        Kind::Custom(codec) => codec.decode(source.next_token()?.payload()?),
        Kind::Integer => Ok(Value::Integer(source.take_int()?)),
        Kind::Float32 => Ok(Value::Float32(f32::from_le_bytes(read_float(source)?))),
        Kind::Float64 => Ok(Value::Float64(f64::from_le_bytes(read_float(source)?))),
        Kind::Bytes => {
            let payload = source.take_item()?;
            check_width(descriptor, payload.len())?;
            Ok(Value::Bytes(payload.into()))
        }
        Kind::String => {
            let payload = source.take_item()?;
            check_width(descriptor, payload.len())?;
            Ok(Value::String(String::from_utf8(payload)?))
        }
        Kind::List(item) => {
            let count = match descriptor.fixed_length {
                Some(n) => n as u64,
                None => source.take_count()?,
            };
            trace!(count, nullable = item.nullable, "reading list");
            // Each element occupies at least one byte of input.
            let mut items = Vec::with_capacity(min(count, source.remainder() as u64) as usize);
            for _ in 0..count {
                if item.nullable && !source.take_presence()? {
                    items.push(Value::Null);
                    continue;
                }
                items.push(read_type(source, definition, item, depth)?);
            }
            Ok(Value::List(items))
        }
        Kind::Object(name) => {
            let nested = definition.nested(name)?;
            Ok(Value::Object(read_structure(source, &nested, depth + 1)?))
        }
    }
}
