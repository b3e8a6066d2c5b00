//! Inheritance queries over a [`Registry`].
//!
//! A cleaned registry drops facts that an ancestor already provides. These
//! helpers walk the inheritance edges to answer questions about the full
//! surface of a class.

use crate::registry::Registry;
use crate::types::{ClassRecord, Element};
use serde::Serialize;
use std::collections::BTreeSet;

/// A member found on a class or one of its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved<'a> {
    /// Name of the class whose table holds the entry.
    pub owner: &'a str,
    pub element: &'a Element,
}

/// Every name reachable from `class` through superclass and interface edges,
/// excluding `class` itself. Names missing from the registry are included but
/// not walked further.
///
/// # Examples
///
/// ```
/// use apilevels::v1::{ClassRecord, Registry, query};
///
/// let mut registry = Registry::new();
/// registry.insert(ClassRecord::new("ArrayList", 1, false)
///     .with_superclass("AbstractList", 1)
///     .with_interface("List", 1));
/// registry.insert(ClassRecord::new("AbstractList", 1, false)
///     .with_superclass("Object", 1));
///
/// let anc = query::ancestors(&registry, "ArrayList");
/// assert!(anc.contains("AbstractList"));
/// assert!(anc.contains("Object"));
/// assert!(anc.contains("List"));
/// assert!(!anc.contains("ArrayList"));
/// ```
pub fn ancestors(registry: &Registry, class: &str) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    let mut stack = vec![class];

    while let Some(name) = stack.pop() {
        let Some(record) = registry.get(name) else {
            continue;
        };
        for edge in record.superclasses().iter().chain(record.interfaces()) {
            if edge.name != class && result.insert(edge.name.clone()) {
                stack.push(&edge.name);
            }
        }
    }

    result
}

/// True if `interface` is reachable from `class` through any edge.
pub fn implements(registry: &Registry, class: &str, interface: &str) -> bool {
    ancestors(registry, class).contains(interface)
}

/// Find the method `key` on `class`, looking at the class first and then its
/// ancestors depth-first, superclasses before interfaces.
///
/// # Examples
///
/// ```
/// use apilevels::v1::{ClassRecord, Registry, query};
///
/// let mut registry = Registry::new();
/// registry.insert(ClassRecord::new("Dog", 1, false).with_method("bark()V", 1));
/// registry.insert(ClassRecord::new("Puppy", 5, false).with_superclass("Dog", 5));
///
/// let found = query::resolve_method(&registry, "Puppy", "bark()V").unwrap();
/// assert_eq!(found.owner, "Dog");
/// assert_eq!(found.element.since, 1);
/// ```
pub fn resolve_method<'a>(registry: &'a Registry, class: &str, key: &str) -> Option<Resolved<'a>> {
    resolve(registry, class, |record| record.method(key))
}

/// Find the field `key` on `class` or one of its ancestors. See
/// [`resolve_method`] for the search order.
pub fn resolve_field<'a>(registry: &'a Registry, class: &str, key: &str) -> Option<Resolved<'a>> {
    resolve(registry, class, |record| record.field(key))
}

fn resolve<'a, F>(registry: &'a Registry, class: &str, lookup: F) -> Option<Resolved<'a>>
where
    F: Fn(&'a ClassRecord) -> Option<&'a Element>,
{
    let mut seen = BTreeSet::new();
    let mut stack = vec![registry.get(class)?];

    while let Some(record) = stack.pop() {
        if !seen.insert(record.name()) {
            continue;
        }
        if let Some(element) = lookup(record) {
            return Some(Resolved {
                owner: record.name(),
                element,
            });
        }
        // Reversed so the first superclass is popped first.
        let parents = record
            .superclasses()
            .iter()
            .chain(record.interfaces())
            .filter_map(|edge| registry.get(&edge.name));
        let mut parents: Vec<_> = parents.collect();
        parents.reverse();
        stack.extend(parents);
    }

    None
}

/// Records the manifest will contain: everything not always hidden.
pub fn public_classes(registry: &Registry) -> impl Iterator<Item = &ClassRecord> {
    registry.iter().filter(|record| !record.always_hidden())
}
