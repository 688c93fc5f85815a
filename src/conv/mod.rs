//! Core of the binary-conversion API
//!
//! This module contains the [`Structure`] trait, implemented by every type
//! declared with [`structure!`](crate::structure), and the high-level
//! functions that move such types to and from the token format:
//!
//!   * [`loads`] / [`load`] and [`dumps`] / [`dump`] for the common case of
//!     a whole buffer or stream holding exactly one structure;
//!   * [`decode`], [`decode_with`] and [`encode`], which take an explicit
//!     [`TokenSource`] or [`Target`] and can be used to read or write a
//!     structure embedded in a larger stream;
//!   * [`encode_record`] and [`decode::decode_structure`], which operate on
//!     dynamic [`Record`]s without any Rust type in between.
//!
//! The sub-module [`target`] defines the [`Target`] trait, which is the dual
//! to [`TokenSource`] and the generic bound of every encoding function.
//!
//! # Nesting
//!
//! Both directions refuse to nest structures more than [`MAX_DEPTH`] levels
//! deep. As definitions can refer to themselves, this is the only bound on
//! the recursion of a malicious input.

use std::io::{Read, Write};

use crate::error::{DecodeResult, EncodeResult};
use crate::schema::{Declaration, Definition, Registry};
use crate::token::{ScriptParser, TokenSource};
use crate::value::Record;

use self::target::{ByteCounter, Target};

pub mod decode;
pub mod encode;
pub mod target;

/// Maximum number of structures that can enclose one another
pub const MAX_DEPTH: usize = 64;

/// Trait for Rust types that have a schema and convert to and from a
/// [`Record`]
///
/// Implementations are normally generated by [`structure!`](crate::structure).
pub trait Structure: Sized {
    /// Name under which the structure is cached and bound
    const NAME: &'static str;

    /// Returns the explicit field list the structure's [`Definition`] is
    /// built from
    fn declaration() -> Declaration;

    fn to_record(&self) -> Record;

    /// Rebuilds a value from a decoded record
    ///
    /// # Errors
    ///
    /// Fails if any field is absent from `record` or cannot be converted to
    /// the type of its Rust field.
    fn from_record(record: Record) -> DecodeResult<Self>;
}

/// Reads one structure from `source` and passes the decoded record to
/// `constructor`
pub fn decode_with<S, F, T>(source: &mut S, definition: &Definition, constructor: F) -> DecodeResult<T>
where
    S: TokenSource + ?Sized,
    F: FnOnce(Record) -> DecodeResult<T>,
{
    constructor(decode::decode_structure(source, definition)?)
}

/// Reads one structure of type `T` from `source`, using `definition`
/// as its schema
pub fn decode<T, S>(source: &mut S, definition: &Definition) -> DecodeResult<T>
where
    T: Structure,
    S: TokenSource + ?Sized,
{
    decode_with(source, definition, T::from_record)
}

/// Decodes a value of type `T` from a byte buffer
///
/// If the feature-flag `check_complete_parse` is enabled, this function
/// also fails with [`DecodeError::TrailingTokens`] when any bytes remain
/// after the structure. Otherwise such bytes are ignored.
///
/// [`DecodeError::TrailingTokens`]: crate::error::DecodeError::TrailingTokens
pub fn loads<T: Structure>(bytes: &[u8], registry: &Registry) -> DecodeResult<T> {
    let definition = registry.definition::<T>()?;
    let mut parser = ScriptParser::new(bytes);
    let ret = decode(&mut parser, &definition)?;
    cfg_if::cfg_if! {
        if #[cfg(feature = "check_complete_parse")] {
            if !parser.is_exhausted() {
                return Err(crate::error::DecodeError::TrailingTokens {
                    offset: parser.offset(),
                    remaining: parser.remainder(),
                });
            }
        }
    }
    Ok(ret)
}

/// Reads `reader` to its end and decodes a value of type `T` from the
/// bytes read, as [`loads`] does
pub fn load<T: Structure, R: Read>(mut reader: R, registry: &Registry) -> DecodeResult<T> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    loads(&buf, registry)
}

/// Appends the encoding of `instance` to `sink`, returning the number of
/// bytes written
pub fn encode<T, U>(instance: &T, sink: &mut U, registry: &Registry) -> EncodeResult<usize>
where
    T: Structure,
    U: Target + ?Sized,
{
    let definition = registry.definition::<T>()?;
    encode_record(sink, &definition, &instance.to_record())
}

/// Appends the encoding of a dynamic record to `sink`
pub fn encode_record<U>(sink: &mut U, definition: &Definition, record: &Record) -> EncodeResult<usize>
where
    U: Target + ?Sized,
{
    encode::encode_structure(sink, definition, record)
}

/// Encodes `instance` into a freshly created target of type `U`
pub fn encode_into<T: Structure, U: Target>(instance: &T, registry: &Registry) -> EncodeResult<U> {
    let mut buf = U::create();
    encode(instance, &mut buf, registry)?;
    Ok(buf)
}

/// Returns the number of bytes `instance` encodes to, without writing them
pub fn encoded_len<T: Structure>(instance: &T, registry: &Registry) -> EncodeResult<usize> {
    let mut counter: ByteCounter = ByteCounter::create();
    encode(instance, &mut counter, registry)
}

pub fn dumps<T: Structure>(instance: &T, registry: &Registry) -> EncodeResult<Vec<u8>> {
    encode_into(instance, registry)
}

/// Encodes `instance` and writes the bytes to `writer`, returning how many
/// were written
///
/// Nothing is written if encoding fails.
pub fn dump<T: Structure, W: Write>(instance: &T, mut writer: W, registry: &Registry) -> EncodeResult<usize> {
    let bytes = dumps(instance, registry)?;
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}
