//! Custom scalars and the bindings table
//!
//! A *custom scalar* is an opaque domain type (a public key, say) that is
//! carried on the wire as a single Bytes token. Its [`CustomCodec`] pairs a
//! decoder from the payload to the domain value with an *encode factory*:
//! given a value, the factory returns a producer closure, and only calling
//! the producer yields the payload bytes. This lets the value decide on its
//! own encoding context, such as the compression form of a point.
//!
//! Codecs and nested structures are both made known to the schema through a
//! [`Bindings`] table, keyed by the type name that fields declare.
//!
//! Decoded custom values are type-erased into [`CustomValue`], which keeps
//! value-equality by downcasting to the concrete type.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::conv::Structure;
use crate::error::{
    BoxError, DecodeError, DecodeResult, EncodeError, EncodeResult, SchemaError, SchemaResult,
};
use crate::schema::Declaration;
use crate::value::Value;

/// Object-safe supertrait of every type that can be held in a [`CustomValue`]
///
/// Implemented automatically for any `'static` type with `Debug`,
/// `PartialEq`, `Send` and `Sync`.
pub trait Scalar: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn Scalar) -> bool;

    fn scalar_type_name(&self) -> &'static str;
}

impl<T> Scalar for T
where
    T: Any + Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Scalar) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn scalar_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased value of a custom scalar
#[derive(Clone)]
pub struct CustomValue(Arc<dyn Scalar>);

impl CustomValue {
    pub fn new<T: Scalar>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns a reference to the inner value if it is of type `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Fully-qualified Rust type name of the inner value
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.scalar_type_name()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Debug for CustomValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

/// Deferred payload of a custom scalar, as returned by an encode factory
pub type Producer = Box<dyn FnOnce() -> Vec<u8>>;

type DecodeFn = dyn Fn(&[u8]) -> Result<CustomValue, BoxError> + Send + Sync;
type EncodeFactory = dyn Fn(&CustomValue) -> Option<Producer> + Send + Sync;

/// Decoder and encode factory of a single custom scalar type
#[derive(Clone)]
pub struct CustomCodec {
    type_name: &'static str,
    decode: Arc<DecodeFn>,
    encode_factory: Arc<EncodeFactory>,
}

impl CustomCodec {
    /// Constructs the codec for custom scalars of type `T`, bound under
    /// `type_name`
    ///
    /// # Examples
    ///
    /// ```
    /// # use bsor::custom::CustomCodec;
    /// #[derive(Debug, Clone, PartialEq)]
    /// struct Tag(u8);
    ///
    /// let codec = CustomCodec::new(
    ///     "Tag",
    ///     |payload: &[u8]| match payload {
    ///         [b] => Ok(Tag(*b)),
    ///         _ => Err("tag must be one byte"),
    ///     },
    ///     |tag: &Tag| {
    ///         let b = tag.0;
    ///         move || vec![b]
    ///     },
    /// );
    /// assert_eq!(codec.type_name(), "Tag");
    /// ```
    pub fn new<T, E, D, F, P>(type_name: &'static str, decode: D, encode_factory: F) -> Self
    where
        T: Scalar,
        E: Into<BoxError>,
        D: Fn(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        F: Fn(&T) -> P + Send + Sync + 'static,
        P: FnOnce() -> Vec<u8> + 'static,
    {
        let decode: Arc<DecodeFn> = Arc::new(move |payload: &[u8]| {
            decode(payload).map(CustomValue::new).map_err(Into::into)
        });
        let encode_factory: Arc<EncodeFactory> = Arc::new(move |value: &CustomValue| {
            value
                .downcast_ref::<T>()
                .map(|value| Box::new(encode_factory(value)) as Producer)
        });
        Self {
            type_name,
            decode,
            encode_factory,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Invokes the decoder on the payload of a single token
    pub fn decode(&self, payload: &[u8]) -> DecodeResult<Value> {
        (self.decode)(payload)
            .map(Value::Custom)
            .map_err(|source| DecodeError::Custom {
                type_name: self.type_name,
                source,
            })
    }

    /// Invokes the encode factory, returning the producer of the payload
    pub fn encode_factory(&self, value: &Value) -> EncodeResult<Producer> {
        let mismatch = |found: &'static str| EncodeError::CustomValueMismatch {
            type_name: self.type_name,
            found,
        };
        match value {
            Value::Custom(custom) => {
                (self.encode_factory)(custom).ok_or_else(|| mismatch(custom.type_name()))
            }
            other => Err(mismatch(other.kind())),
        }
    }
}

impl Debug for CustomCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCodec")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// What a type name is bound to
#[derive(Clone, Debug)]
pub(crate) enum Binding {
    Structure(fn() -> Declaration),
    Scalar(CustomCodec),
}

/// Table of type names that fields may refer to beyond the primitives
///
/// Binding a name a second time replaces the earlier binding of the same
/// kind. Binding one name both as a structure and as a custom scalar makes
/// it ambiguous, which is reported when a field refers to it.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    table: HashMap<&'static str, Binding>,
    ambiguous: HashSet<&'static str>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a structure type under its declared name
    #[must_use]
    pub fn structure<T: Structure>(self) -> Self {
        self.declaration(T::NAME, T::declaration)
    }

    /// Binds a hand-written declaration under `name`, for structures that
    /// are only handled as [`Record`](crate::Record)s
    #[must_use]
    pub fn declaration(self, name: &'static str, declare: fn() -> Declaration) -> Self {
        self.bind(name, Binding::Structure(declare))
    }

    /// Binds a custom scalar codec under its type name
    #[must_use]
    pub fn scalar(self, codec: CustomCodec) -> Self {
        self.bind(codec.type_name(), Binding::Scalar(codec))
    }

    fn bind(mut self, name: &'static str, binding: Binding) -> Self {
        let clash = matches!(
            (self.table.get(name), &binding),
            (Some(Binding::Structure(_)), Binding::Scalar(_))
                | (Some(Binding::Scalar(_)), Binding::Structure(_))
        );
        if clash {
            self.ambiguous.insert(name);
        }
        self.table.insert(name, binding);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Returns the binding of `name` along with the key it is bound under
    pub(crate) fn lookup(&self, name: &str) -> SchemaResult<Option<(&'static str, &Binding)>> {
        if self.ambiguous.contains(name) {
            return Err(SchemaError::AmbiguousBinding {
                type_name: name.to_owned(),
            });
        }
        Ok(self.table.get_key_value(name).map(|(k, v)| (*k, v)))
    }
}

/// Implements [`FieldValue`](crate::FieldValue) for a custom scalar type,
/// so that it can be used as the type of a [`structure!`](crate::structure)
/// field.
///
/// The type must be `Clone`, and the field's type name must be bound to a
/// [`CustomCodec`] for the same type.
#[macro_export]
macro_rules! custom_field_value {
    ($t:ty) => {
        impl $crate::FieldValue for $t {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Custom($crate::custom::CustomValue::new(
                    ::std::clone::Clone::clone(self),
                ))
            }

            fn from_value(value: $crate::Value) -> $crate::DecodeResult<Self> {
                match value {
                    $crate::Value::Custom(custom) => custom
                        .downcast_ref::<$t>()
                        .cloned()
                        .ok_or_else(|| $crate::DecodeError::ValueMismatch {
                            expected: stringify!($t),
                            found: custom.type_name(),
                        }),
                    other => Err($crate::DecodeError::ValueMismatch {
                        expected: stringify!($t),
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}
