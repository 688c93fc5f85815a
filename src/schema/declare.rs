//! Explicit field declarations
//!
//! A [`Declaration`] lists every field of a structure with its name, the
//! name of its Rust type, its field id, and an optional fixed length. It is
//! the only input to [`Definition`](super::Definition) building, and is
//! normally produced by the [`structure!`](crate::structure) macro, though
//! it can just as well be written out by hand for structures that are only
//! ever handled as [`Record`](crate::Record)s.

/// One entry of a [`Declaration`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    /// Rust type of the field as written, e.g. `Option<Vec<u8>>`
    pub type_name: &'static str,
    pub id: u64,
    pub length: Option<usize>,
}

/// Field list of a single structure type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: &'static str,
    pub fields: Vec<FieldDecl>,
}

impl Declaration {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Appends a field, with an optional fixed length
    #[must_use]
    pub fn declare(
        mut self,
        name: &'static str,
        type_name: &'static str,
        id: u64,
        length: Option<usize>,
    ) -> Self {
        self.fields.push(FieldDecl {
            name,
            type_name,
            id,
            length,
        });
        self
    }

    /// Appends a field without a fixed length
    #[must_use]
    pub fn field(self, name: &'static str, type_name: &'static str, id: u64) -> Self {
        self.declare(name, type_name, id, None)
    }
}

/// Declares a structure type together with its schema
///
/// Every field must carry a `#[bsor(id = N)]` attribute, optionally with a
/// fixed length as `#[bsor(id = N, len = L)]`, before any other attributes
/// it has. The macro emits the struct as written (minus the `bsor`
/// attributes), along with implementations of
/// [`Structure`](crate::Structure) and [`FieldValue`](crate::FieldValue).
///
/// The schema type of each field is derived from its Rust type as written,
/// so nested structures and custom scalars must be referred to by the bare
/// name they are bound under in the [`Bindings`](crate::Bindings) table.
///
/// # Examples
///
/// ```
/// use bsor::{structure, Bindings, Registry};
///
/// structure! {
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct Greeting {
///         #[bsor(id = 1)]
///         pub count: u32,
///         #[bsor(id = 2)]
///         pub text: Option<String>,
///     }
/// }
///
/// let registry = Registry::new(Bindings::new());
/// let hello = Greeting { count: 2, text: Some("hi".to_owned()) };
/// let bytes = bsor::dumps(&hello, &registry).unwrap();
/// assert_eq!(bytes, [0x52, 0x51, 0x52, 0x52, 0x02, b'h', b'i']);
/// assert_eq!(bsor::loads::<Greeting>(&bytes, &registry).unwrap(), hello);
/// ```
#[macro_export]
macro_rules! structure {
    (@len) => {
        ::std::option::Option::None
    };
    (@len $len:literal) => {
        ::std::option::Option::Some($len)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[bsor(id = $id:literal $(, len = $len:literal)?)]
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Structure for $name {
            const NAME: &'static str = stringify!($name);

            fn declaration() -> $crate::schema::Declaration {
                $crate::schema::Declaration::new(stringify!($name))
                    $(
                        .declare(
                            stringify!($field),
                            stringify!($fty),
                            $id,
                            $crate::structure!(@len $($len)?),
                        )
                    )*
            }

            fn to_record(&self) -> $crate::Record {
                let mut record = $crate::Record::new();
                $(
                    record.insert(
                        stringify!($field),
                        $crate::FieldValue::to_value(&self.$field),
                    );
                )*
                record
            }

            fn from_record(mut record: $crate::Record) -> $crate::DecodeResult<Self> {
                Ok(Self {
                    $(
                        $field: record.take_field(stringify!($name), stringify!($field))?,
                    )*
                })
            }
        }

        impl $crate::FieldValue for $name {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Object($crate::Structure::to_record(self))
            }

            fn from_value(value: $crate::Value) -> $crate::DecodeResult<Self> {
                match value {
                    $crate::Value::Object(record) => {
                        <Self as $crate::Structure>::from_record(record)
                    }
                    other => Err($crate::DecodeError::ValueMismatch {
                        expected: stringify!($name),
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}
