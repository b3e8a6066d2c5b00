#![doc = include_str!("../README.md")]

mod closure;
mod error;
mod query;
mod registry;
mod snapshot;
mod types;

pub mod v1 {
    //! Versioned public API for apilevels types, passes and queries.
    //!
    //! # Facts
    //!
    //! - [`Element`]: a name, the earliest version it is known to hold, and
    //!   a deprecation marker
    //! - [`ClassRecord`]: one class or interface with its edges, members and
    //!   visibility history
    //! - [`HiddenState`]: whether a class has ever been seen public
    //!
    //! # Building
    //!
    //! - [`Snapshot`], [`ClassObservation`], [`MemberObservation`]: what a
    //!   scanner saw in one released version
    //! - [`Registry`]: every class by name; ingests snapshots in version order
    //!
    //! # Cleaning
    //!
    //! [`Registry::clean`] runs the closure passes once over every record:
    //!
    //! 1. [`Registry::remove_hidden_superclasses`]
    //! 2. [`Registry::inline_from_hidden_ancestors`]
    //! 3. [`Registry::remove_implicit_interfaces`]
    //! 4. [`Registry::remove_overriding_methods`]
    //!
    //! # Example: a hidden base class is flattened away
    //!
    //! ```
    //! use apilevels::v1::*;
    //!
    //! let mut registry = Registry::new();
    //! registry.ingest(&Snapshot::new(1)
    //!     .with_class(ClassObservation::new("HiddenBase").hidden().with_field("x"))
    //!     .with_class(ClassObservation::new("PublicSub").with_superclass("HiddenBase")))
    //!     .unwrap();
    //!
    //! registry.clean().unwrap();
    //!
    //! let sub = registry.get("PublicSub").unwrap();
    //! assert!(sub.superclasses().is_empty());
    //! assert_eq!(sub.field("x").unwrap().since, 1);
    //! assert!(registry.get("HiddenBase").unwrap().always_hidden());
    //! ```

    /// Inheritance queries over a registry.
    ///
    /// # Example: a pruned method is still reachable through inheritance
    ///
    /// ```
    /// use apilevels::v1::{ClassRecord, Registry, query};
    ///
    /// let mut registry = Registry::new();
    /// registry.insert(ClassRecord::new("Animal", 1, false).with_superclass("Object", 1));
    /// registry.insert(ClassRecord::new("Dog", 1, false)
    ///     .with_superclass("Animal", 1)
    ///     .with_method("bark()V", 1));
    /// registry.insert(ClassRecord::new("Puppy", 5, false)
    ///     .with_superclass("Dog", 5)
    ///     .with_method("bark()V", 5));
    ///
    /// registry.clean().unwrap();
    ///
    /// assert!(registry.get("Puppy").unwrap().method("bark()V").is_none());
    /// let found = query::resolve_method(&registry, "Puppy", "bark()V").unwrap();
    /// assert_eq!(found.owner, "Dog");
    /// ```
    pub mod query {
        pub use crate::query::{
            Resolved, ancestors, implements, public_classes, resolve_field, resolve_method,
        };
    }
    pub use crate::error::{Error, Result};
    pub use crate::registry::{CleanOptions, CleanStats, Registry};
    pub use crate::snapshot::{ClassObservation, MemberObservation, Snapshot};
    pub use crate::types::{
        CONSTRUCTOR_PREFIX, ClassRecord, Element, HiddenState, InlineState, LEGACY_BUILDER_RETURN,
        Version,
    };
}
