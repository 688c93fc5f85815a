//! Encoder
//!
//! Recursive descent over a [`Record`], driven by a [`Definition`] and
//! writing to any [`Target`]. Fields are emitted in declaration order, with
//! null values of nullable fields and zero defaults of non-nullable
//! Integer, String and Bytes fields left off the wire altogether.

use tracing::{debug, trace};

use super::MAX_DEPTH;
use super::target::Target;
use crate::error::{EncodeError, EncodeResult, LengthError};
use crate::schema::{Definition, FieldDescriptor, Kind};
use crate::token::sink::TokenSink;
use crate::value::{Record, Value};

/// Writes one structure to `sink`, returning the number of bytes written
///
/// A field that the record lacks altogether is treated as null if it is
/// nullable, and as its zero default if it has one; otherwise it is an
/// error. On error, whatever was already written to `sink` is garbage.
pub fn encode_structure<U>(
    sink: &mut U,
    definition: &Definition,
    record: &Record,
) -> EncodeResult<usize>
where
    U: Target + ?Sized,
{
    write_structure(sink, definition, record, 0)
}

/// Writes one value of the type described by `descriptor`
///
/// `field` names the field the value belongs to, for error reporting.
pub fn encode_type<U>(
    sink: &mut U,
    definition: &Definition,
    field: &'static str,
    descriptor: &FieldDescriptor,
    value: &Value,
) -> EncodeResult<usize>
where
    U: Target + ?Sized,
{
    write_type(sink, definition, field, descriptor, value, 0)
}

fn write_structure<U>(
    sink: &mut U,
    definition: &Definition,
    record: &Record,
    depth: usize,
) -> EncodeResult<usize>
where
    U: Target + ?Sized,
{
    if depth >= MAX_DEPTH {
        return Err(EncodeError::DepthExceeded { limit: MAX_DEPTH });
    }
    let structure = definition.name();

    let mut surviving = Vec::with_capacity(definition.len());
    for (name, descriptor) in definition.get_fields() {
        let value = match record.get(name) {
            Some(value) => value,
            None if descriptor.nullable || descriptor.zero_default().is_some() => {
                debug!(structure, field = name, "skipping absent field");
                continue;
            }
            None => {
                return Err(EncodeError::MissingField {
                    structure,
                    field: name,
                })
            }
        };
        if value.is_null() {
            if descriptor.nullable {
                debug!(structure, field = name, "skipping null field");
                continue;
            }
            return Err(EncodeError::UnexpectedNull {
                structure,
                field: name,
            });
        }
        if descriptor.is_zero_default(value) {
            debug!(structure, field = name, "skipping default field");
            continue;
        }
        surviving.push((*name, descriptor, value));
    }

    trace!(structure, count = surviving.len(), depth, "writing structure");
    let mut written = sink.push_u64(surviving.len() as u64);
    for (name, descriptor, value) in surviving {
        trace!(structure, field = name, id = descriptor.id, "writing field");
        written += sink.push_u64(descriptor.id);
        written += write_type(sink, definition, name, descriptor, value, depth)?;
    }
    Ok(written)
}

fn write_type<U>(
    sink: &mut U,
    definition: &Definition,
    field: &'static str,
    descriptor: &FieldDescriptor,
    value: &Value,
    depth: usize,
) -> EncodeResult<usize>
where
    U: Target + ?Sized,
{
    match (&descriptor.kind, value) {
        (_, Value::Null) => Err(EncodeError::UnexpectedNull {
            structure: definition.name(),
            field,
        }),
        (Kind::Custom(codec), value) => {
            let produce = codec.encode_factory(value)?;
            Ok(sink.push_item(&produce()))
        }
        (Kind::Integer, Value::Integer(n)) => Ok(sink.push_int(n)),
        (Kind::Float32, Value::Float32(x)) => Ok(sink.push_item(&x.to_le_bytes())),
        (Kind::Float64, Value::Float64(x)) => Ok(sink.push_item(&x.to_le_bytes())),
        (Kind::Bytes, Value::Bytes(bytes)) => Ok(sink.push_item(bytes)),
        (Kind::String, Value::String(s)) => Ok(sink.push_item(s.as_bytes())),
        (Kind::List(item), Value::List(items)) => {
            let mut written = match descriptor.fixed_length {
                Some(exact) if exact != items.len() => {
                    return Err(EncodeError::Length {
                        structure: definition.name(),
                        field,
                        error: LengthError::WrongLength {
                            exact,
                            actual: items.len(),
                        },
                    })
                }
                Some(_) => 0,
                None => sink.push_u64(items.len() as u64),
            };
            for element in items {
                if item.nullable {
                    let present = !element.is_null();
                    written += sink.push_presence(present);
                    if !present {
                        continue;
                    }
                }
                written += write_type(sink, definition, field, item, element, depth)?;
            }
            Ok(written)
        }
        (Kind::Object(name), Value::Object(record)) => {
            let nested = definition.nested(name)?;
            write_structure(sink, &nested, record, depth + 1)
        }
        (_, other) => Err(EncodeError::TypeMismatch {
            structure: definition.name(),
            field,
            expected: descriptor.field_type(),
            found: other.kind(),
        }),
    }
}
