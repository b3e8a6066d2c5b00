//! Inheritance-aware closure passes over a [`Registry`].
//!
//! Each read-only pass runs in two steps. First it decides, for every record
//! against the unmodified registry, what to drop. Then it rebuilds the
//! affected records. The decide step may run on the rayon pool.

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::types::{CONSTRUCTOR_PREFIX, ClassRecord, Element, InlineState, RemovedEdge};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, trace};

// ============================================================================
// Predicates
// ============================================================================

impl ClassRecord {
    /// True if this class implements `target` by `target.since`, either
    /// directly, through a super-interface, or through a superclass.
    ///
    /// Only edges introduced no later than `target` count. Names missing
    /// from the registry prove nothing.
    pub fn transitively_implements(&self, target: &Element, registry: &Registry) -> bool {
        let mut visited = HashSet::new();
        self.implements_within(target, registry, &mut visited)
    }

    fn implements_within<'a>(
        &'a self,
        target: &Element,
        registry: &'a Registry,
        visited: &mut HashSet<&'a str>,
    ) -> bool {
        if !visited.insert(self.name()) {
            return false;
        }
        for edge in &self.interfaces {
            if !edge.introduced_no_later_than(target) {
                continue;
            }
            if edge.name == target.name {
                return true;
            }
            if let Some(parent) = registry.get(&edge.name)
                && parent.implements_within(target, registry, visited)
            {
                return true;
            }
        }
        for edge in &self.superclasses {
            if edge.introduced_no_later_than(target)
                && let Some(parent) = registry.get(&edge.name)
                && parent.implements_within(target, registry, visited)
            {
                return true;
            }
        }
        false
    }

    /// Interface edges already provided by a superclass at the point they
    /// were declared here.
    pub fn implicit_interfaces(&self, registry: &Registry) -> Vec<String> {
        if self.interfaces.is_empty() || self.superclasses.is_empty() {
            return Vec::new();
        }
        self.interfaces
            .iter()
            .filter(|iface| {
                self.superclasses
                    .iter()
                    .filter(|sup| sup.introduced_no_later_than(iface) && sup.name != self.name())
                    .filter_map(|sup| registry.get(&sup.name))
                    .any(|parent| parent.transitively_implements(iface, registry))
            })
            .map(|iface| iface.name.clone())
            .collect()
    }

    /// True if this class declares `method` no later than `method.since`, or
    /// inherits such a declaration.
    pub fn is_override(&self, method: &Element, registry: &Registry) -> bool {
        let mut visited = HashSet::new();
        self.declares_or_inherits(method, registry, &mut visited)
    }

    /// True if some ancestor reachable through edges introduced no later
    /// than `method` already provides it.
    pub fn is_override_of_inherited(&self, method: &Element, registry: &Registry) -> bool {
        let mut visited = HashSet::from([self.name()]);
        self.inherits_method(method, registry, &mut visited)
    }

    fn declares_or_inherits<'a>(
        &'a self,
        method: &Element,
        registry: &'a Registry,
        visited: &mut HashSet<&'a str>,
    ) -> bool {
        if !visited.insert(self.name()) {
            return false;
        }
        if self
            .methods
            .get(&method.name)
            .is_some_and(|local| local.introduced_no_later_than(method))
        {
            return true;
        }
        self.inherits_method(method, registry, visited)
    }

    fn inherits_method<'a>(
        &'a self,
        method: &Element,
        registry: &'a Registry,
        visited: &mut HashSet<&'a str>,
    ) -> bool {
        self.superclasses
            .iter()
            .chain(&self.interfaces)
            .filter(|edge| edge.introduced_no_later_than(method))
            .filter_map(|edge| registry.get(&edge.name))
            .any(|parent| parent.declares_or_inherits(method, registry, visited))
    }

    /// Non-constructor method keys fully provided by inheritance.
    pub fn overriding_methods(&self, registry: &Registry) -> Vec<String> {
        self.methods
            .iter()
            .filter(|(key, method)| {
                !key.starts_with(CONSTRUCTOR_PREFIX)
                    && self.is_override_of_inherited(method, registry)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// The first superclass edge whose class is known and always hidden.
    pub fn first_hidden_superclass(&self, registry: &Registry) -> Option<&str> {
        self.superclasses
            .iter()
            .find(|edge| registry.get(&edge.name).is_some_and(ClassRecord::always_hidden))
            .map(|edge| edge.name.as_str())
    }

    // ── Rebuild helpers ──────────────────────────────────────────────

    /// Drop the hidden superclass edge `name` and lower every remaining edge
    /// to the earliest `since` of the original set.
    pub(crate) fn drop_hidden_superclass(&mut self, name: &str) -> Option<Element> {
        let earliest = self.superclasses.iter().map(|e| e.since).min()?;
        let (position, removed) = self.take_superclass(name)?;
        for edge in &mut self.superclasses {
            edge.lower_since(earliest);
        }
        self.removed_superclasses.push(RemovedEdge {
            position,
            edge: removed.clone(),
        });
        Some(removed)
    }

    pub(crate) fn drop_interfaces(&mut self, names: &[String]) -> usize {
        let before = self.interfaces.len();
        self.interfaces.retain(|e| !names.contains(&e.name));
        before - self.interfaces.len()
    }

    pub(crate) fn drop_methods(&mut self, keys: &[String]) -> usize {
        let before = self.methods.len();
        self.methods.retain(|key, _| !keys.contains(key));
        before - self.methods.len()
    }

    /// Names of every superclass edge in declaration order, with removed
    /// edges put back where they stood.
    fn superclass_chain(&self) -> Vec<String> {
        let mut chain: Vec<&Element> = self.superclasses.iter().collect();
        for removed in self.removed_superclasses.iter().rev() {
            let at = removed.position.min(chain.len());
            chain.insert(at, &removed.edge);
        }
        chain.into_iter().map(|e| e.name.clone()).collect()
    }

    /// Copy members in, keeping any entry this class already has.
    fn absorb(&mut self, fields: &[Element], methods: &[Element]) -> usize {
        let mut added = 0;
        for field in fields {
            if !self.fields.contains_key(&field.name) {
                self.fields.insert(field.name.clone(), field.clone());
                added += 1;
            }
        }
        for method in methods {
            if !self.methods.contains_key(&method.name) {
                self.methods.insert(method.name.clone(), method.clone());
                added += 1;
            }
        }
        added
    }
}

// ============================================================================
// Passes
// ============================================================================

impl Registry {
    /// Decide a change for every record against the current registry.
    fn mark<T, F>(&self, parallel: bool, decide: F) -> Vec<(String, T)>
    where
        T: Send,
        F: Fn(&ClassRecord) -> Option<T> + Sync + Send,
    {
        if parallel {
            self.classes
                .par_iter()
                .filter_map(|(name, record)| decide(record).map(|t| (name.clone(), t)))
                .collect()
        } else {
            self.classes
                .iter()
                .filter_map(|(name, record)| decide(record).map(|t| (name.clone(), t)))
                .collect()
        }
    }

    /// Remove, per record, the first superclass edge naming an always-hidden
    /// class. Returns the number of edges removed.
    ///
    /// Only one hidden edge is taken off each record per call. A class whose
    /// superclass changed between two hidden classes keeps the second edge.
    pub fn remove_hidden_superclasses(&mut self, parallel: bool) -> usize {
        let registry = &*self;
        let plan = registry.mark(parallel, |record| {
            record.first_hidden_superclass(registry).map(str::to_string)
        });
        let mut removed = 0;
        for (name, hidden) in plan {
            if let Some(record) = self.classes.get_mut(&name)
                && record.drop_hidden_superclass(&hidden).is_some()
            {
                trace!(class = %name, superclass = %hidden, "removed hidden superclass");
                removed += 1;
            }
        }
        debug!(removed, "hidden superclass removal");
        removed
    }

    /// Flatten every always-hidden ancestor into its descendants. Returns the
    /// number of members copied.
    pub fn inline_from_hidden_ancestors(&mut self) -> Result<usize> {
        let names: Vec<String> = self.classes.keys().cloned().collect();
        let mut copied = 0;
        for name in &names {
            copied += self.inline_class(name)?;
        }
        debug!(copied, "hidden ancestor flattening");
        Ok(copied)
    }

    /// Flatten the always-hidden ancestors of one class into it, ancestors
    /// first. Runs at most once per class; later calls return 0.
    ///
    /// Fails with [`Error::InheritanceCycle`] if a hidden ancestor chain
    /// leads back to a class still being flattened. Every class on the
    /// failing path is returned to pending, so the registry stays usable.
    pub fn inline_class(&mut self, name: &str) -> Result<usize> {
        let chain = match self.classes.get_mut(name) {
            None => return Ok(0),
            Some(record) => match record.inline_state {
                InlineState::Done => return Ok(0),
                InlineState::InProgress => {
                    return Err(Error::InheritanceCycle(name.to_string()));
                }
                InlineState::Pending => {
                    record.inline_state = InlineState::InProgress;
                    record.superclass_chain()
                }
            },
        };

        let result = self.inline_chain(name, chain);
        if let Some(record) = self.classes.get_mut(name) {
            record.inline_state = if result.is_ok() {
                InlineState::Done
            } else {
                InlineState::Pending
            };
        }
        result
    }

    fn inline_chain(&mut self, name: &str, chain: Vec<String>) -> Result<usize> {
        let mut copied = 0;
        for ancestor in chain {
            if !self.get(&ancestor).is_some_and(ClassRecord::always_hidden) {
                continue;
            }
            copied += self.inline_class(&ancestor)?;
            let Some(hidden) = self.get(&ancestor) else {
                continue;
            };
            let fields: Vec<Element> = hidden.fields.values().cloned().collect();
            let methods: Vec<Element> = hidden.methods.values().cloned().collect();
            if let Some(record) = self.classes.get_mut(name) {
                let added = record.absorb(&fields, &methods);
                trace!(class = %name, ancestor = %ancestor, added, "inlined hidden ancestor");
                copied += added;
            }
        }
        Ok(copied)
    }

    /// Remove interface edges an ancestor already provides. Returns the
    /// number of edges removed.
    pub fn remove_implicit_interfaces(&mut self, parallel: bool) -> usize {
        let registry = &*self;
        let plan = registry.mark(parallel, |record| {
            let implicit = record.implicit_interfaces(registry);
            (!implicit.is_empty()).then_some(implicit)
        });
        let mut removed = 0;
        for (name, implicit) in plan {
            if let Some(record) = self.classes.get_mut(&name) {
                trace!(class = %name, interfaces = ?implicit, "removed implicit interfaces");
                removed += record.drop_interfaces(&implicit);
            }
        }
        debug!(removed, "implicit interface elision");
        removed
    }

    /// Remove methods fully provided by inheritance. Constructors stay.
    /// Returns the number of methods removed.
    pub fn remove_overriding_methods(&mut self, parallel: bool) -> usize {
        let registry = &*self;
        let plan = registry.mark(parallel, |record| {
            let overrides = record.overriding_methods(registry);
            (!overrides.is_empty()).then_some(overrides)
        });
        let mut removed = 0;
        for (name, overrides) in plan {
            if let Some(record) = self.classes.get_mut(&name) {
                trace!(class = %name, methods = ?overrides, "removed overriding methods");
                removed += record.drop_methods(&overrides);
            }
        }
        debug!(removed, "override elision");
        removed
    }
}
