//! Schema model
//!
//! A [`Definition`] is the immutable, once-built table that drives both
//! the decoder and the encoder for one structure type: an ordered list of
//! named [`FieldDescriptor`]s, each carrying a field id, a wire type, a
//! nullability flag, and an optional fixed length.
//!
//! Definitions are built from a [`Declaration`], the explicit list of
//! `(name, type name, id, length)` entries that the [`structure!`] macro
//! generates for a Rust struct. Type names are resolved by the pure
//! function in [`typename`], and definitions are memoized by a
//! [`Registry`], through which nested structure definitions are also
//! resolved lazily.
//!
//! [`structure!`]: crate::structure

pub mod declare;
pub mod registry;
pub mod typename;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};

use num_bigint::BigInt;
use num_traits::Zero;

use crate::custom::{Bindings, CustomCodec};
use crate::error::{SchemaError, SchemaResult, UnknownField};
use crate::value::{Bytes, Value};

pub use declare::{Declaration, FieldDecl};
pub use registry::Registry;

/// Wire-level type of a field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Float32,
    Float64,
    String,
    Bytes,
    List,
    Object,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::List => "list",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Resolved type of a field, including what the wire type alone omits
#[derive(Clone, Debug)]
pub enum Kind {
    Integer,
    Float32,
    Float64,
    String,
    Bytes,
    /// List whose elements are described by the boxed descriptor
    List(Box<FieldDescriptor>),
    /// Nested structure, by the name it is bound under
    Object(&'static str),
    /// Custom scalar, carried on the wire as Bytes
    Custom(CustomCodec),
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub id: u64,
    pub kind: Kind,
    pub nullable: bool,
    /// Byte-length of a String or Bytes payload, or element count of a
    /// List; never transmitted
    pub fixed_length: Option<usize>,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(id: u64, kind: Kind) -> Self {
        Self {
            id,
            kind,
            nullable: false,
            fixed_length: None,
        }
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self.kind {
            Kind::Integer => FieldType::Integer,
            Kind::Float32 => FieldType::Float32,
            Kind::Float64 => FieldType::Float64,
            Kind::String => FieldType::String,
            Kind::Bytes | Kind::Custom(_) => FieldType::Bytes,
            Kind::List(_) => FieldType::List,
            Kind::Object(_) => FieldType::Object,
        }
    }

    /// Returns the value that stands in for this field when it is absent
    /// from the wire, if it is not nullable and has one.
    ///
    /// Only Integer, String and Bytes fields have a zero default. A declared
    /// fixed length does not remove it, as it constrains only payloads that
    /// are actually present.
    #[must_use]
    pub fn zero_default(&self) -> Option<Value> {
        if self.nullable {
            return None;
        }
        match self.kind {
            Kind::Integer => Some(Value::Integer(BigInt::zero())),
            Kind::String => Some(Value::String(String::new())),
            Kind::Bytes => Some(Value::Bytes(Bytes::new())),
            _ => None,
        }
    }

    /// Returns `true` if `value` is this field's zero default, meaning the
    /// encoder may leave the field off the wire.
    #[must_use]
    pub fn is_zero_default(&self, value: &Value) -> bool {
        if self.nullable {
            return false;
        }
        match (&self.kind, value) {
            (Kind::Integer, Value::Integer(n)) => n.is_zero(),
            (Kind::String, Value::String(s)) => s.is_empty(),
            (Kind::Bytes, Value::Bytes(b)) => b.is_empty(),
            _ => false,
        }
    }

    /// Name of the innermost structure this descriptor refers to, looking
    /// through any levels of list
    fn structure_name(&self) -> Option<&'static str> {
        match &self.kind {
            Kind::Object(name) => Some(*name),
            Kind::List(item) => item.structure_name(),
            _ => None,
        }
    }
}

/// Immutable schema of a single structure type
#[derive(Debug)]
pub struct Definition {
    name: &'static str,
    fields: Vec<(&'static str, FieldDescriptor)>,
    ids: HashMap<u64, usize>,
    registry: Weak<registry::Inner>,
}

impl Definition {
    pub(crate) fn build(
        declaration: Declaration,
        bindings: &Bindings,
        registry: Weak<registry::Inner>,
    ) -> SchemaResult<Self> {
        let structure = declaration.name;
        let mut fields: Vec<(&'static str, FieldDescriptor)> =
            Vec::with_capacity(declaration.fields.len());
        let mut ids: HashMap<u64, usize> = HashMap::with_capacity(declaration.fields.len());

        for decl in declaration.fields {
            if fields.iter().any(|(name, _)| *name == decl.name) {
                return Err(SchemaError::DuplicateFieldName {
                    structure,
                    field: decl.name,
                });
            }
            if let Some(&ix) = ids.get(&decl.id) {
                return Err(SchemaError::DuplicateFieldId {
                    structure,
                    id: decl.id,
                    first: fields[ix].0,
                    second: decl.name,
                });
            }
            let resolver = typename::Resolver::new(structure, decl.name, bindings);
            let mut descriptor = resolver.resolve(decl.type_name, decl.id)?;
            if let Some(length) = decl.length {
                resolver.apply_length(&mut descriptor, length)?;
            }
            ids.insert(decl.id, fields.len());
            fields.push((decl.name, descriptor));
        }

        Ok(Self {
            name: structure,
            fields,
            ids,
            registry,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declaration-order position of the field with the given id
    pub fn position(&self, id: u64) -> Result<usize, UnknownField> {
        self.ids.get(&id).copied().ok_or(UnknownField {
            structure: self.name,
            id,
        })
    }

    /// Looks up a field by id
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] if no field of this structure has the id.
    pub fn get_field(&self, id: u64) -> Result<(&'static str, &FieldDescriptor), UnknownField> {
        let (name, descriptor) = &self.fields[self.position(id)?];
        Ok((*name, descriptor))
    }

    /// All fields, in declaration order
    #[must_use]
    pub fn get_fields(&self) -> &[(&'static str, FieldDescriptor)] {
        &self.fields
    }

    /// Returns the element descriptor of a List field, along with its
    /// static element count, if any
    pub fn get_list_item_constraint(
        &self,
        id: u64,
    ) -> SchemaResult<(&FieldDescriptor, Option<usize>)> {
        let (_, descriptor) = self.get_field(id)?;
        match &descriptor.kind {
            Kind::List(item) => Ok((item, descriptor.fixed_length)),
            _ => Err(SchemaError::NotAList {
                structure: self.name,
                id,
            }),
        }
    }

    /// Returns the definition of the structure an Object field refers to
    ///
    /// For List fields, the structure that the (innermost) elements refer
    /// to is returned instead. Custom scalars and other primitive fields
    /// have no nested definition.
    pub fn get_nested_definition(&self, id: u64) -> SchemaResult<Arc<Definition>> {
        let (_, descriptor) = self.get_field(id)?;
        match descriptor.structure_name() {
            Some(name) => self.nested(name),
            None => Err(SchemaError::NotAStructure {
                structure: self.name,
                id,
            }),
        }
    }

    /// Resolves the definition bound under `name` through the owning registry
    pub(crate) fn nested(&self, name: &str) -> SchemaResult<Arc<Definition>> {
        match self.registry.upgrade() {
            Some(inner) => registry::Inner::by_name(&inner, name),
            None => Err(SchemaError::RegistryDropped {
                structure: self.name,
            }),
        }
    }
}
