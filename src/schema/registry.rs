//! Memoized definition cache
//!
//! A [`Registry`] owns the [`Bindings`] table and every [`Definition`]
//! built against it. Definitions are built on first request and then
//! shared; a definition refers to nested structures only by name and
//! resolves them through a weak handle back into the registry, which is
//! what lets self- and mutually-recursive structures build without
//! recursing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{Declaration, Definition};
use crate::conv::Structure;
use crate::custom::{Binding, Bindings};
use crate::error::{SchemaError, SchemaResult};

#[derive(Debug)]
pub(crate) struct Inner {
    bindings: Bindings,
    cache: RwLock<HashMap<&'static str, Arc<Definition>>>,
}

impl Inner {
    fn cached(&self, name: &str) -> Option<Arc<Definition>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(name).cloned()
    }

    fn get_or_build(
        this: &Arc<Self>,
        name: &'static str,
        declare: fn() -> Declaration,
    ) -> SchemaResult<Arc<Definition>> {
        if let Some(definition) = this.cached(name) {
            return Ok(definition);
        }
        let definition = Arc::new(Definition::build(
            declare(),
            &this.bindings,
            Arc::downgrade(this),
        )?);
        debug!(structure = name, fields = definition.len(), "built definition");
        let mut cache = this.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Concurrent builders of one name keep whichever copy was inserted first.
        Ok(cache.entry(name).or_insert(definition).clone())
    }

    pub(crate) fn by_name(this: &Arc<Self>, name: &str) -> SchemaResult<Arc<Definition>> {
        if let Some(definition) = this.cached(name) {
            return Ok(definition);
        }
        match this.bindings.lookup(name)? {
            Some((key, Binding::Structure(declare))) => Self::get_or_build(this, key, *declare),
            _ => Err(SchemaError::UnboundStructure {
                type_name: name.to_owned(),
            }),
        }
    }
}

/// Shared cache of [`Definition`]s built against one [`Bindings`] table
///
/// Cloning a `Registry` is cheap and yields a handle to the same cache.
#[derive(Clone, Debug)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    #[must_use]
    pub fn new(bindings: Bindings) -> Self {
        Self {
            inner: Arc::new(Inner {
                bindings,
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    /// Returns the definition of `T`, building it if necessary
    ///
    /// `T` need not be bound in the bindings table itself, but every other
    /// structure it refers to must be.
    pub fn definition<T: Structure>(&self) -> SchemaResult<Arc<Definition>> {
        Inner::get_or_build(&self.inner, T::NAME, T::declaration)
    }

    /// Returns the definition of a structure by the name it is bound under
    pub fn definition_by_name(&self, name: &str) -> SchemaResult<Arc<Definition>> {
        Inner::by_name(&self.inner, name)
    }

    /// Builds the definitions of `T` and of every structure reachable from
    /// it, returning how many there are
    ///
    /// Any error that would otherwise surface part-way through a decode or
    /// encode call, such as a nested structure that was never bound, is
    /// reported here instead.
    pub fn preload<T: Structure>(&self) -> SchemaResult<usize> {
        let root = self.definition::<T>()?;
        let mut visited: HashSet<&'static str> = HashSet::new();
        visited.insert(root.name());
        let mut pending = vec![root];
        while let Some(definition) = pending.pop() {
            for (_, descriptor) in definition.get_fields() {
                let Some(name) = descriptor.structure_name() else {
                    continue;
                };
                if visited.insert(name) {
                    pending.push(definition.nested(name)?);
                }
            }
        }
        Ok(visited.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Kind;

    crate::structure! {
        struct Node {
            #[bsor(id = 1)]
            value: i64,
            #[bsor(id = 2)]
            children: Vec<Node>,
            #[bsor(id = 3)]
            other: Option<Box<Other>>,
        }
    }

    crate::structure! {
        struct Other {
            #[bsor(id = 1)]
            back: Option<Box<Node>>,
        }
    }

    crate::structure! {
        struct Orphan {
            #[bsor(id = 1)]
            missing: Vec<Unbound>,
        }
    }

    crate::structure! {
        struct Clash {
            #[bsor(id = 1)]
            a: u8,
            #[bsor(id = 1)]
            b: u8,
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Unbound;

    crate::custom_field_value!(Unbound);

    fn registry() -> Registry {
        Registry::new(Bindings::new().structure::<Node>().structure::<Other>())
    }

    #[test]
    fn memoized() {
        let registry = registry();
        let a = registry.definition::<Node>().unwrap();
        let b = registry.definition_by_name("Node").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn mutual_recursion() {
        let registry = registry();
        assert_eq!(registry.preload::<Node>().unwrap(), 2);
        let node = registry.definition::<Node>().unwrap();
        let other = node.get_nested_definition(3).unwrap();
        assert_eq!(other.name(), "Other");
        let back = other.get_nested_definition(1).unwrap();
        assert!(Arc::ptr_eq(&back, &node));
        let (item, count) = node.get_list_item_constraint(2).unwrap();
        assert!(matches!(item.kind, Kind::Object("Node")));
        assert_eq!(item.id, 2);
        assert_eq!(count, None);
    }

    #[test]
    fn unbound_nested() {
        let registry = Registry::new(Bindings::new());
        // The field itself cannot resolve, so the definition fails to build.
        assert!(matches!(
            registry.definition::<Orphan>(),
            Err(SchemaError::UnresolvedType { field: "missing", .. })
        ));
        assert!(matches!(
            registry.definition_by_name("Orphan"),
            Err(SchemaError::UnboundStructure { .. })
        ));
    }

    #[test]
    fn duplicate_ids() {
        let registry = Registry::new(Bindings::new());
        assert!(matches!(
            registry.definition::<Clash>(),
            Err(SchemaError::DuplicateFieldId {
                id: 1,
                first: "a",
                second: "b",
                ..
            })
        ));
    }

    #[test]
    fn lookups() {
        let registry = registry();
        let node = registry.definition::<Node>().unwrap();
        assert_eq!(node.get_field(2).unwrap().0, "children");
        assert!(matches!(
            node.get_field(999),
            Err(crate::error::UnknownField { id: 999, .. })
        ));
        assert!(matches!(
            node.get_list_item_constraint(1),
            Err(SchemaError::NotAList { id: 1, .. })
        ));
        assert!(matches!(
            node.get_nested_definition(1),
            Err(SchemaError::NotAStructure { id: 1, .. })
        ));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_across_threads() {
        assert_send_sync::<Registry>();
        assert_send_sync::<Arc<Definition>>();

        let registry = registry();
        let built: Vec<Arc<Definition>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| registry.definition::<Node>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let cached = registry.definition::<Node>().unwrap();
        assert!(built.iter().all(|d| Arc::ptr_eq(d, &cached)));
    }

    #[test]
    fn dropped_registry() {
        let node = registry().definition::<Node>().unwrap();
        assert!(matches!(
            node.get_nested_definition(3),
            Err(SchemaError::RegistryDropped { structure: "Node" })
        ));
    }
}
