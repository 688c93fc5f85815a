//! Error types
//!
//! This module contains the three error classes of the codec, each of
//! which corresponds to a distinct phase of operation:
//!
//!   * [`SchemaError`] is raised while a [`Definition`] is being built,
//!     and is always fatal to the build.
//!   * [`DecodeError`] is raised while a token stream is being consumed.
//!     After a decode error the position of the stream is undefined and
//!     the caller is expected to discard it.
//!   * [`EncodeError`] is raised while a structure is being serialized.
//!     Any bytes already written to the target must be discarded.
//!
//! A handful of narrower error types ([`WidthError`], [`LengthError`],
//! [`HexConvError`] and [`UnknownField`]) are also defined here and are
//! embedded into the three primary classes where they occur.
//!
//! [`Definition`]: crate::schema::Definition

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::string::FromUtf8Error;

use num_bigint::BigInt;

use crate::schema::FieldType;

/// Boxed error type returned by custom-scalar decoders
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Enumerated error type for failures related to schema constructs
/// that impose a check on the byte-width on their prospective values.
///
/// Structurally similar to [`LengthError`], an analoguous error-type
/// relating to the number of elements in a collection-type, rather than
/// the number of bytes in a potentially opaque schema type.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum WidthError {
    /// Requirement of precise byte-width not satisfied
    WrongWidth { exact: usize, actual: usize },
}

impl Display for WidthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthError::WrongWidth { exact, actual } => {
                write!(
                    f,
                    "{actual}-byte value violated requirement of {exact} bytes"
                )
            }
        }
    }
}

impl Error for WidthError {}

/// Enumerated error type for failures related to schema constructs
/// that impose a check on the element-count of their prospective
/// values, which are typically list types.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum LengthError {
    /// Requirement of precise element-count not satisfied
    WrongLength { exact: usize, actual: usize },
}

impl Display for LengthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthError::WrongLength { exact, actual } => {
                write!(
                    f,
                    "{actual}-element value violated requirement of {exact} elements"
                )
            }
        }
    }
}

impl Error for LengthError {}

/// Error type representing all possible conditions for invalidity
/// encountered when attempting to parse a string-type as a series
/// of hex-encoded bytes.
#[derive(Clone, PartialEq, Eq, Ord, PartialOrd)]
pub enum HexConvError {
    /// Error case for odd-length strings
    OddParity(String),
    /// Error case for strings containing non-hex characters,
    /// i.e. anything not in `[0-9a-fA-F]`.
    NonHex(String),
}

impl Debug for HexConvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OddParity(invalid) => {
                write!(f, "non-even length-parity for string `{}`", invalid)
            }
            Self::NonHex(invalid) => write!(f, "non-hex character found in string `{}`", invalid),
        }
    }
}

impl Display for HexConvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OddParity(_) => {
                write!(f, "hex-conversion failed on odd-length string")
            }
            Self::NonHex(_) => {
                write!(f, "hex-conversion failed on non-hex character")
            }
        }
    }
}

impl Error for HexConvError {}

/// A field identifier that is not declared by the structure it was looked up in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownField {
    pub structure: &'static str,
    pub id: u64,
}

impl Display for UnknownField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "structure `{}` has no field with id {}", self.structure, self.id)
    }
}

impl Error for UnknownField {}

/// Errors raised while building a [`Definition`](crate::schema::Definition)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// A declared type name could not be resolved to a primitive, a list,
    /// or any entry of the bindings table
    UnresolvedType {
        structure: &'static str,
        field: &'static str,
        type_name: String,
    },
    /// A type name was bound both as a structure and as a custom scalar
    AmbiguousBinding { type_name: String },
    /// A type name was looked up as a structure but is not bound as one
    UnboundStructure { type_name: String },
    /// Two fields of one structure share an identifier
    DuplicateFieldId {
        structure: &'static str,
        id: u64,
        first: &'static str,
        second: &'static str,
    },
    /// Two fields of one structure share a name
    DuplicateFieldName {
        structure: &'static str,
        field: &'static str,
    },
    /// `Option<Option<_>>` and similar have no wire representation
    NestedNullable {
        structure: &'static str,
        field: &'static str,
    },
    /// A fixed length was declared on a type that cannot carry one
    LengthNotApplicable {
        structure: &'static str,
        field: &'static str,
        field_type: FieldType,
    },
    /// A declared fixed length disagrees with the length intrinsic to the type name
    ConflictingLength {
        structure: &'static str,
        field: &'static str,
        declared: usize,
        intrinsic: usize,
    },
    /// Lookup of an identifier the structure does not declare
    UnknownField(UnknownField),
    /// A list constraint was requested for a field that is not a list
    NotAList { structure: &'static str, id: u64 },
    /// A nested definition was requested for a field that is not a structure
    NotAStructure { structure: &'static str, id: u64 },
    /// A nested definition was requested after its registry had been dropped
    RegistryDropped { structure: &'static str },
}

impl From<UnknownField> for SchemaError {
    fn from(err: UnknownField) -> Self {
        Self::UnknownField(err)
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnresolvedType {
                structure,
                field,
                type_name,
            } => write!(
                f,
                "unknown type `{type_name}` for field `{structure}.{field}`"
            ),
            SchemaError::AmbiguousBinding { type_name } => write!(
                f,
                "type `{type_name}` is bound both as a structure and as a custom scalar"
            ),
            SchemaError::UnboundStructure { type_name } => {
                write!(f, "no structure bound under the name `{type_name}`")
            }
            SchemaError::DuplicateFieldId {
                structure,
                id,
                first,
                second,
            } => write!(
                f,
                "fields `{first}` and `{second}` of `{structure}` share the id {id}"
            ),
            SchemaError::DuplicateFieldName { structure, field } => {
                write!(f, "field `{field}` declared twice in `{structure}`")
            }
            SchemaError::NestedNullable { structure, field } => {
                write!(f, "field `{structure}.{field}` is nullable more than once")
            }
            SchemaError::LengthNotApplicable {
                structure,
                field,
                field_type,
            } => write!(
                f,
                "fixed length declared on field `{structure}.{field}` of type {field_type}"
            ),
            SchemaError::ConflictingLength {
                structure,
                field,
                declared,
                intrinsic,
            } => write!(
                f,
                "field `{structure}.{field}` declares length {declared} but its type fixes {intrinsic}"
            ),
            SchemaError::UnknownField(err) => Display::fmt(err, f),
            SchemaError::NotAList { structure, id } => {
                write!(f, "field {id} of `{structure}` is not a list")
            }
            SchemaError::NotAStructure { structure, id } => {
                write!(f, "field {id} of `{structure}` is not a nested structure")
            }
            SchemaError::RegistryDropped { structure } => write!(
                f,
                "registry backing the definition of `{structure}` is no longer alive"
            ),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SchemaError::UnknownField(err) => Some(err),
            _ => None,
        }
    }
}

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Errors raised while consuming a token stream
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// A token was requested but the stream has no bytes left
    UnexpectedEnd { offset: usize },
    /// A token announced more bytes than the stream holds
    Truncated {
        offset: usize,
        requested: usize,
        remaining: usize,
    },
    /// A payload was required but the token at hand is not a push
    NullPayload { op: u8 },
    /// A float token whose payload is not exactly 4 or 8 bytes long
    InvalidFloatLength { expected: usize, actual: usize },
    /// A nullable list slot whose presence prefix is neither `0` nor `1`
    InvalidPresence { op: u8 },
    InvalidUtf8(FromUtf8Error),
    /// A fixed-width payload of the wrong width
    Width(WidthError),
    /// A list of the wrong length for a fixed-length Rust type
    Length(LengthError),
    /// An integer token that does not fit the context it was read in
    OutOfRange {
        context: &'static str,
        value: BigInt,
    },
    UnknownField(UnknownField),
    DuplicateField { structure: &'static str, id: u64 },
    /// A non-nullable field without a zero default was absent from the stream
    MissingField {
        structure: &'static str,
        field: &'static str,
    },
    /// A value did not have the shape its Rust field type expects
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A custom scalar decoder rejected its payload
    Custom {
        type_name: &'static str,
        source: BoxError,
    },
    Schema(SchemaError),
    DepthExceeded { limit: usize },
    /// Tokens remained after the outermost structure was decoded
    TrailingTokens { offset: usize, remaining: usize },
    Io(std::io::Error),
}

impl From<UnknownField> for DecodeError {
    fn from(err: UnknownField) -> Self {
        Self::UnknownField(err)
    }
}

impl From<SchemaError> for DecodeError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownField(err) => Self::UnknownField(err),
            other => Self::Schema(other),
        }
    }
}

impl From<WidthError> for DecodeError {
    fn from(err: WidthError) -> Self {
        Self::Width(err)
    }
}

impl From<LengthError> for DecodeError {
    fn from(err: LengthError) -> Self {
        Self::Length(err)
    }
}

impl From<FromUtf8Error> for DecodeError {
    fn from(err: FromUtf8Error) -> Self {
        Self::InvalidUtf8(err)
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedEnd { offset } => {
                write!(f, "token expected at byte {offset} but the stream is exhausted")
            }
            DecodeError::Truncated {
                offset,
                requested,
                remaining,
            } => write!(
                f,
                "token at byte {offset} requires {requested} bytes but only {remaining} remain"
            ),
            DecodeError::NullPayload { op } => {
                write!(f, "expected a push token, found opcode 0x{op:02x}")
            }
            DecodeError::InvalidFloatLength { expected, actual } => write!(
                f,
                "invalid float length, expected {expected} bytes, got {actual}"
            ),
            DecodeError::InvalidPresence { op } => {
                write!(f, "invalid pointer-array prefix 0x{op:02x}")
            }
            DecodeError::InvalidUtf8(err) => write!(f, "invalid string payload: {err}"),
            DecodeError::Width(err) => Display::fmt(err, f),
            DecodeError::Length(err) => Display::fmt(err, f),
            DecodeError::OutOfRange { context, value } => {
                write!(f, "{context} {value} is out of range")
            }
            DecodeError::UnknownField(err) => Display::fmt(err, f),
            DecodeError::DuplicateField { structure, id } => {
                write!(f, "field {id} of `{structure}` occurs more than once")
            }
            DecodeError::MissingField { structure, field } => write!(
                f,
                "non-nullable field `{structure}.{field}` is absent and has no default"
            ),
            DecodeError::ValueMismatch { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
            DecodeError::Custom { type_name, source } => {
                write!(f, "custom decoder for `{type_name}` failed: {source}")
            }
            DecodeError::Schema(err) => write!(f, "schema error during decode: {err}"),
            DecodeError::DepthExceeded { limit } => {
                write!(f, "structures nested deeper than {limit} levels")
            }
            DecodeError::TrailingTokens { offset, remaining } => write!(
                f,
                "{remaining} bytes left over at byte {offset} after the outermost structure"
            ),
            DecodeError::Io(err) => write!(f, "failed to read token stream: {err}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::InvalidUtf8(err) => Some(err),
            DecodeError::Width(err) => Some(err),
            DecodeError::Length(err) => Some(err),
            DecodeError::UnknownField(err) => Some(err),
            DecodeError::Custom { source, .. } => Some(&**source),
            DecodeError::Schema(err) => Some(err),
            DecodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors raised while serializing a structure
#[derive(Debug)]
#[non_exhaustive]
pub enum EncodeError {
    Schema(SchemaError),
    /// The instance has no value for a declared field
    MissingField {
        structure: &'static str,
        field: &'static str,
    },
    /// A null value in a position that is not nullable
    UnexpectedNull {
        structure: &'static str,
        field: &'static str,
    },
    /// A value whose shape does not match its descriptor
    TypeMismatch {
        structure: &'static str,
        field: &'static str,
        expected: FieldType,
        found: &'static str,
    },
    /// A fixed-length list holding the wrong number of elements
    Length {
        structure: &'static str,
        field: &'static str,
        error: LengthError,
    },
    /// A custom scalar encoder was handed a value of some other type
    CustomValueMismatch {
        type_name: &'static str,
        found: &'static str,
    },
    DepthExceeded { limit: usize },
    Io(std::io::Error),
}

impl From<SchemaError> for EncodeError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Schema(err) => write!(f, "schema error during encode: {err}"),
            EncodeError::MissingField { structure, field } => {
                write!(f, "instance of `{structure}` has no value for `{field}`")
            }
            EncodeError::UnexpectedNull { structure, field } => {
                write!(f, "null value for non-nullable `{structure}.{field}`")
            }
            EncodeError::TypeMismatch {
                structure,
                field,
                expected,
                found,
            } => write!(
                f,
                "field `{structure}.{field}` expects {expected}, found {found}"
            ),
            EncodeError::Length {
                structure,
                field,
                error,
            } => write!(f, "field `{structure}.{field}`: {error}"),
            EncodeError::CustomValueMismatch { type_name, found } => {
                write!(f, "custom encoder for `{type_name}` cannot encode {found}")
            }
            EncodeError::DepthExceeded { limit } => {
                write!(f, "structures nested deeper than {limit} levels")
            }
            EncodeError::Io(err) => write!(f, "failed to write token stream: {err}"),
        }
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EncodeError::Schema(err) => Some(err),
            EncodeError::Length { error, .. } => Some(error),
            EncodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn errors_threadsafe() {
        dummy::<SchemaError>();
        dummy::<DecodeError>();
        dummy::<EncodeError>();
    }

    #[test]
    fn float_length_message() {
        let err = DecodeError::InvalidFloatLength {
            expected: 4,
            actual: 3,
        };
        assert!(err.to_string().starts_with("invalid float length"));
    }

    #[test]
    fn unknown_field_lifts_out_of_schema() {
        let err: DecodeError = SchemaError::from(UnknownField {
            structure: "S",
            id: 999,
        })
        .into();
        assert!(matches!(
            err,
            DecodeError::UnknownField(UnknownField { id: 999, .. })
        ));
    }
}
