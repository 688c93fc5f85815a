//! Instance model
//!
//! Decoding produces, and encoding consumes, a dynamic [`Value`] tree whose
//! structures are [`Record`]s: insertion-ordered maps from field name to
//! value. Typed Rust structures declared with
//! [`structure!`](crate::structure) convert to and from `Record` through
//! the [`FieldValue`] trait, which is implemented here for every primitive
//! Rust type the schema language recognizes.
//!
//! # `Bytes`
//!
//! [`Bytes`] is a variable-length byte-sequence whose contents are otherwise
//! opaque. It is distinct from `Vec<u8>`, which the schema treats as a list
//! of small integers, each carried as its own token.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use indexmap::IndexMap;
use num_bigint::BigInt;
#[cfg(feature = "serde_impls")]
use serde::Serialize;

use crate::custom::CustomValue;
use crate::error::{DecodeError, DecodeResult, HexConvError, LengthError};
use crate::util::bytes_of_hex;

/// Variable-length opaque byte-sequence, carried on the wire as a single
/// push token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Bytes(Vec<u8>);

#[cfg(feature = "serde_impls")]
impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl Bytes {
    /// Constructs a new, empty byte-sequence
    ///
    /// As with `Vec::new()`, no allocation is performed until bytes are added
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Constructs a `Bytes` value from a `Vec<u8>`
    #[must_use]
    pub const fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Destructs a `Bytes` value and returns the actual `Vec<u8>` it contained
    ///
    /// The method name is chosen so as to avoid ambiguity with `[u8]::to_vec`
    /// arising from deref-coercion.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&'_ [u8]> for Bytes {
    fn from(bytes: &'_ [u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    fn from(arr: [u8; N]) -> Self {
        Self(arr.to_vec())
    }
}

impl<const N: usize> From<&'_ [u8; N]> for Bytes {
    fn from(arr: &'_ [u8; N]) -> Self {
        Self(arr.to_vec())
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(val: Bytes) -> Self {
        val.0
    }
}

impl FromIterator<u8> for Bytes {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a hex-string into the bytes it encodes
///
/// # Examples
///
/// ```
/// # use bsor::Bytes;
/// let b: Bytes = "cafe".parse().unwrap();
/// assert_eq!(&b[..], &[0xca, 0xfe]);
/// ```
impl FromStr for Bytes {
    type Err = HexConvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bytes_of_hex(s).map(Self)
    }
}

/// Dynamically-typed value of a single field, list element, or structure
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent value of a nullable field or list slot
    Null,
    Integer(BigInt),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Bytes),
    List(Vec<Value>),
    Object(Record),
    /// Domain value produced by a custom-scalar codec
    Custom(CustomValue),
}

impl Value {
    /// Short human-readable name of the variant, for error messages
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Custom(custom) => custom.type_name(),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<&'_ str> for Value {
    fn from(s: &'_ str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Decoded structure instance: field values addressed by field name
///
/// Iteration follows insertion order, which after a decode is the
/// declaration order of the structure's fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self(IndexMap::with_capacity(n))
    }

    /// Sets the value of a field, returning the value it replaces, if any
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style variant of [`insert`](Record::insert)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Removes and returns the value of a field
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    /// Removes the value of a field and converts it into its Rust type
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] if the record has no value for
    /// `field`, or any error raised by [`FieldValue::from_value`].
    pub fn take_field<T: FieldValue>(
        &mut self,
        structure: &'static str,
        field: &'static str,
    ) -> DecodeResult<T> {
        match self.take(field) {
            Some(value) => T::from_value(value),
            None => Err(DecodeError::MissingField { structure, field }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);

    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Conversion between a Rust field type and its dynamic [`Value`]
///
/// Implementations exist for every type name the schema resolver accepts,
/// so that any field of a [`structure!`](crate::structure) declaration can
/// be moved into and out of a [`Record`].
pub trait FieldValue: Sized {
    fn to_value(&self) -> Value;

    /// Reconstructs a value of this type from its dynamic form
    ///
    /// # Errors
    ///
    /// Fails if `value` has a shape this type cannot represent.
    fn from_value(value: Value) -> DecodeResult<Self>;
}

fn mismatch<T>(expected: &'static str, found: &Value) -> DecodeResult<T> {
    Err(DecodeError::ValueMismatch {
        expected,
        found: found.kind(),
    })
}

macro_rules! impl_integer_value {
    ($($t:ty),+ $(,)?) => {
        $(
            impl FieldValue for $t {
                fn to_value(&self) -> Value {
                    Value::Integer(BigInt::from(*self))
                }

                fn from_value(value: Value) -> DecodeResult<Self> {
                    match value {
                        Value::Integer(n) => <$t>::try_from(&n).map_err(|_| {
                            DecodeError::OutOfRange {
                                context: stringify!($t),
                                value: n,
                            }
                        }),
                        other => mismatch("integer", &other),
                    }
                }
            }
        )+
    };
}

impl_integer_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FieldValue for BigInt {
    fn to_value(&self) -> Value {
        Value::Integer(self.clone())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Integer(n) => Ok(n),
            other => mismatch("integer", &other),
        }
    }
}

impl FieldValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float32(*self)
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Float32(x) => Ok(x),
            other => mismatch("float32", &other),
        }
    }
}

impl FieldValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Float64(x) => Ok(x),
            other => mismatch("float64", &other),
        }
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl FieldValue for Bytes {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => mismatch("bytes", &other),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn to_value(&self) -> Value {
        T::to_value(self)
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("list", &other),
        }
    }
}

impl<T: FieldValue, const N: usize> FieldValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        let items = Vec::<T>::from_value(value)?;
        let actual = items.len();
        <[T; N]>::try_from(items).map_err(|_| {
            DecodeError::Length(LengthError::WrongLength { exact: N, actual })
        })
    }
}
