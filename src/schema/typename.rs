//! Type-name resolution
//!
//! Field types are declared by the name of their Rust type, as written in
//! the structure declaration. Resolution is a pure function of that name,
//! the name of the enclosing structure, and the [`Bindings`] table:
//!
//!   * whitespace is insignificant, and a leading `a::b::` path is ignored;
//!   * `Option<X>` is `X`, made nullable, and `Box<X>` is just `X`;
//!   * the integer, float, `String` and `Bytes` primitives map onto the
//!     corresponding wire types;
//!   * `Vec<X>` is a list of `X`, and `[X; N]` a list of `X` with a static
//!     count of `N`;
//!   * `FixedBytes<N>` is Bytes with a fixed length of `N`;
//!   * the enclosing structure's own name refers to itself;
//!   * any other name must be bound in the `Bindings` table, either to a
//!     structure or to a custom scalar codec.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::{FieldDescriptor, FieldType, Kind};
use crate::custom::{Binding, Bindings};
use crate::error::{SchemaError, SchemaResult};

lazy_static! {
    static ref PRIMITIVES: HashMap<&'static str, FieldType> = {
        let mut table = HashMap::new();
        for name in [
            "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
            "usize", "BigInt",
        ] {
            table.insert(name, FieldType::Integer);
        }
        table.insert("f32", FieldType::Float32);
        table.insert("f64", FieldType::Float64);
        table.insert("String", FieldType::String);
        table.insert("Bytes", FieldType::Bytes);
        table
    };
}

/// Removes all whitespace from a type name
#[must_use]
pub fn normalize(type_name: &str) -> String {
    type_name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drops the module path in front of the outermost type constructor
///
/// # Examples
///
/// ```
/// # use bsor::schema::typename::strip_path;
/// assert_eq!(strip_path("std::vec::Vec<a::B>"), "Vec<a::B>");
/// assert_eq!(strip_path("[u8;4]"), "[u8;4]");
/// ```
#[must_use]
pub fn strip_path(name: &str) -> &str {
    let head_end = name.find(|c: char| c == '<' || c == '[').unwrap_or(name.len());
    match name[..head_end].rfind("::") {
        Some(ix) => &name[ix + 2..],
        None => name,
    }
}

fn generic_arg<'a>(name: &'a str, head: &str) -> Option<&'a str> {
    name.strip_prefix(head)?.strip_prefix('<')?.strip_suffix('>')
}

fn array_parts(name: &str) -> Option<(&str, &str)> {
    name.strip_prefix('[')?.strip_suffix(']')?.rsplit_once(';')
}

fn unbox(mut name: &str) -> &str {
    name = strip_path(name);
    while let Some(inner) = generic_arg(name, "Box") {
        name = strip_path(inner);
    }
    name
}

fn primitive_kind(field_type: FieldType) -> Option<Kind> {
    match field_type {
        FieldType::Integer => Some(Kind::Integer),
        FieldType::Float32 => Some(Kind::Float32),
        FieldType::Float64 => Some(Kind::Float64),
        FieldType::String => Some(Kind::String),
        FieldType::Bytes => Some(Kind::Bytes),
        FieldType::List | FieldType::Object => None,
    }
}

/// Resolves the type names of a single field
pub(crate) struct Resolver<'a> {
    structure: &'static str,
    field: &'static str,
    bindings: &'a Bindings,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(structure: &'static str, field: &'static str, bindings: &'a Bindings) -> Self {
        Self {
            structure,
            field,
            bindings,
        }
    }

    fn unresolved(&self, name: &str) -> SchemaError {
        SchemaError::UnresolvedType {
            structure: self.structure,
            field: self.field,
            type_name: name.to_owned(),
        }
    }

    /// Resolves a type name into the descriptor of a field with the given id
    ///
    /// List element descriptors carry the same id as the field they belong to.
    pub(crate) fn resolve(&self, type_name: &str, id: u64) -> SchemaResult<FieldDescriptor> {
        self.resolve_normalized(&normalize(type_name), id)
    }

    fn resolve_normalized(&self, name: &str, id: u64) -> SchemaResult<FieldDescriptor> {
        let name = unbox(name);
        match generic_arg(name, "Option") {
            Some(inner) => {
                let mut descriptor = self.resolve_required(inner, id)?;
                descriptor.nullable = true;
                Ok(descriptor)
            }
            None => self.resolve_required(name, id),
        }
    }

    fn resolve_required(&self, name: &str, id: u64) -> SchemaResult<FieldDescriptor> {
        let name = unbox(name);
        if generic_arg(name, "Option").is_some() {
            return Err(SchemaError::NestedNullable {
                structure: self.structure,
                field: self.field,
            });
        }
        if let Some(kind) = PRIMITIVES.get(name).copied().and_then(primitive_kind) {
            return Ok(FieldDescriptor::new(id, kind));
        }
        if let Some(inner) = generic_arg(name, "Vec") {
            let item = self.resolve_normalized(inner, id)?;
            return Ok(FieldDescriptor::new(id, Kind::List(Box::new(item))));
        }
        if let Some((inner, count)) = array_parts(name) {
            let count: usize = count.parse().map_err(|_| self.unresolved(name))?;
            let item = self.resolve_normalized(inner, id)?;
            let mut descriptor = FieldDescriptor::new(id, Kind::List(Box::new(item)));
            descriptor.fixed_length = Some(count);
            return Ok(descriptor);
        }
        if let Some(width) = generic_arg(name, "FixedBytes") {
            let width: usize = width.parse().map_err(|_| self.unresolved(name))?;
            let mut descriptor = FieldDescriptor::new(id, Kind::Bytes);
            descriptor.fixed_length = Some(width);
            return Ok(descriptor);
        }
        if name == self.structure {
            return Ok(FieldDescriptor::new(id, Kind::Object(self.structure)));
        }
        match self.bindings.lookup(name)? {
            Some((key, Binding::Structure(_))) => Ok(FieldDescriptor::new(id, Kind::Object(key))),
            Some((_, Binding::Scalar(codec))) => {
                Ok(FieldDescriptor::new(id, Kind::Custom(codec.clone())))
            }
            None => Err(self.unresolved(name)),
        }
    }

    /// Applies an explicitly declared fixed length to a resolved descriptor
    pub(crate) fn apply_length(
        &self,
        descriptor: &mut FieldDescriptor,
        length: usize,
    ) -> SchemaResult<()> {
        match descriptor.kind {
            Kind::List(_) | Kind::String | Kind::Bytes => match descriptor.fixed_length {
                Some(intrinsic) if intrinsic != length => Err(SchemaError::ConflictingLength {
                    structure: self.structure,
                    field: self.field,
                    declared: length,
                    intrinsic,
                }),
                _ => {
                    descriptor.fixed_length = Some(length);
                    Ok(())
                }
            },
            _ => Err(SchemaError::LengthNotApplicable {
                structure: self.structure,
                field: self.field,
                field_type: descriptor.field_type(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::custom::CustomCodec;

    crate::structure! {
        struct Leaf {
            #[bsor(id = 1)]
            n: u8,
        }
    }

    fn bindings() -> Bindings {
        Bindings::new().structure::<Leaf>().scalar(CustomCodec::new(
            "Key",
            |payload: &[u8]| Ok::<_, String>(payload.to_vec()),
            |key: &Vec<u8>| {
                let key = key.clone();
                move || key
            },
        ))
    }

    fn resolve(type_name: &str) -> SchemaResult<FieldDescriptor> {
        Resolver::new("Tree", "f", &bindings()).resolve(type_name, 3)
    }

    fn shape(d: &FieldDescriptor) -> String {
        let inner = match &d.kind {
            Kind::List(item) => format!("list({})", shape(item)),
            Kind::Object(name) => format!("object({name})"),
            Kind::Custom(codec) => format!("custom({})", codec.type_name()),
            _ => d.field_type().to_string(),
        };
        let nullable = if d.nullable { "?" } else { "" };
        match d.fixed_length {
            Some(n) => format!("{inner}[{n}]{nullable}"),
            None => format!("{inner}{nullable}"),
        }
    }

    fn check(type_name: &str, expected: &str) {
        let d = resolve(type_name).unwrap();
        assert_eq!(d.id, 3);
        assert_eq!(shape(&d), expected, "resolving {type_name}");
    }

    #[test]
    fn primitives() {
        check("u8", "integer");
        check("i128", "integer");
        check("num_bigint::BigInt", "integer");
        check("f32", "float32");
        check("f64", "float64");
        check("String", "string");
        check("bsor::Bytes", "bytes");
        check("FixedBytes<33>", "bytes[33]");
    }

    #[test]
    fn composites() {
        check("Option < i32 >", "integer?");
        check("Vec<Option<String>>", "list(string?)");
        check("Option<Vec<i64>>", "list(integer)?");
        check("[u16; 4]", "list(integer)[4]");
        check("Vec<[Leaf;2]>", "list(list(object(Leaf))[2])");
        check("Option<Box<Tree>>", "object(Tree)?");
        check("Key", "custom(Key)");
        check("Vec<Option<Key>>", "list(custom(Key)?)");
    }

    #[test]
    fn failures() {
        assert!(matches!(
            resolve("Option<Option<i32>>"),
            Err(SchemaError::NestedNullable {
                structure: "Tree",
                field: "f"
            })
        ));
        assert!(matches!(
            resolve("HashMap<u8,u8>"),
            Err(SchemaError::UnresolvedType { type_name, .. }) if type_name == "HashMap<u8,u8>"
        ));
        assert!(matches!(
            resolve("[u8; N]"),
            Err(SchemaError::UnresolvedType { .. })
        ));
        assert!(resolve("bool").is_err());
    }

    #[test]
    fn ambiguous_binding() {
        let bindings = bindings().scalar(CustomCodec::new(
            "Leaf",
            |_: &[u8]| Ok::<_, String>(0u8),
            |_: &u8| Vec::new,
        ));
        assert!(matches!(
            Resolver::new("Tree", "f", &bindings).resolve("Leaf", 1),
            Err(SchemaError::AmbiguousBinding { type_name }) if type_name == "Leaf"
        ));
    }

    #[test]
    fn declared_lengths() {
        let bindings = bindings();
        let r = Resolver::new("Tree", "f", &bindings);
        let mut d = r.resolve("String", 1).unwrap();
        r.apply_length(&mut d, 8).unwrap();
        assert_eq!(d.fixed_length, Some(8));

        let mut d = r.resolve("[u8; 4]", 1).unwrap();
        assert!(r.apply_length(&mut d, 4).is_ok());
        assert!(matches!(
            r.apply_length(&mut d, 5),
            Err(SchemaError::ConflictingLength {
                declared: 5,
                intrinsic: 4,
                ..
            })
        ));

        let mut d = r.resolve("u32", 1).unwrap();
        assert!(matches!(
            r.apply_length(&mut d, 4),
            Err(SchemaError::LengthNotApplicable {
                field_type: FieldType::Integer,
                ..
            })
        ));
    }
}
