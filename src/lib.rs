//! Schema-driven structured values over Bitcoin-script tokens
//!
//! # Overview
//!
//! This library serializes structured values as a sequence of minimal
//! Bitcoin-script data pushes. A structure is written as its field count,
//! followed by one `(field id, value)` pair per field; integers are
//! script numbers, strings and byte arrays are raw pushes, lists are
//! count-prefixed, and nested structures recurse. Because only data pushes
//! and the small-integer opcodes are used, the output is valid script and
//! can be embedded as-is in an unspendable output or a data envelope.
//!
//! The shape of a structure is held in a [`Definition`](schema::Definition),
//! which is built once from an explicit [`Declaration`](schema::Declaration)
//! and memoized by a [`Registry`]. The [`structure!`] macro generates a
//! Rust struct together with its declaration and the conversions to and
//! from a dynamic [`Record`]. Values of application-specific types that
//! travel as opaque byte payloads are supported through [`CustomCodec`]s,
//! bound by name in the [`Bindings`] table a registry is created with.
//!
//! # Encoding rules
//!
//! A few rules keep encodings compact and deterministic:
//!
//!   * every push is minimal, so each value has exactly one encoding;
//!   * fields are written in declaration order;
//!   * null values of nullable fields, and the zero default (`0`, `""`, or
//!     empty bytes) of non-nullable Integer, String and Bytes fields, are
//!     not written at all, and are restored on decode;
//!   * lists with a fixed length omit their count;
//!   * elements of a list of a nullable type carry a presence marker.
//!
//! # Usage
//!
//! The functions [`dumps`] and [`loads`] (and their streaming counterparts
//! [`dump`] and [`load`]) handle the common case; [`encode_record`] and
//! [`decode::decode_structure`](conv::decode::decode_structure) operate on
//! dynamic records, and [`token`] exposes the token layer itself.

pub mod conv;
pub mod custom;
pub mod error;
pub mod fixed;
pub mod schema;
pub mod token;
pub mod util;
pub mod value;

pub use num_bigint::BigInt;

pub use crate::conv::{
    decode, decode_with, dump, dumps, encode, encode_into, encode_record, encoded_len, load,
    loads, target::Target, Structure, MAX_DEPTH,
};
pub use crate::custom::{Bindings, CustomCodec, CustomValue};
pub use crate::error::{
    DecodeError, DecodeResult, EncodeError, EncodeResult, SchemaError, SchemaResult,
};
pub use crate::fixed::FixedBytes;
pub use crate::schema::{Definition, FieldType, Registry};
pub use crate::token::{ScriptParser, TokenSource};
pub use crate::value::{Bytes, FieldValue, Record, Value};
