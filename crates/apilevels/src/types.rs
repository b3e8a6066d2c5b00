use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// An API level. Released snapshots are numbered upward from 1.
pub type Version = u32;

/// Return-type suffix of a covariant base type that no longer exists in the
/// library. Method keys ending in it are rewritten to return the declaring
/// class instead, so both historical encodings land on one entry.
pub const LEGACY_BUILDER_RETURN: &str = ")Ljava/lang/AbstractStringBuilder;";

/// Prefix shared by every constructor key. Constructors are never inherited.
pub const CONSTRUCTOR_PREFIX: &str = "<init>(";

// ============================================================================
// Element
// ============================================================================

/// One versioned fact: a class, a member signature, or an inheritance edge.
///
/// `since` only ever moves down. `deprecated` reflects the latest observation.
///
/// # JSON shape
///
/// ```json
/// { "name": "toString()Ljava/lang/String;", "since": 1, "deprecated": true }
/// ```
///
/// `deprecated` is omitted when false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub since: Version,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Element {
    /// Create a fact first observed at `since`
    pub fn new(name: impl Into<String>, since: Version, deprecated: bool) -> Self {
        Self {
            name: name.into(),
            since,
            deprecated,
        }
    }

    /// Fold in another observation: keep the earliest version, take the
    /// latest deprecation marker.
    pub fn update(&mut self, version: Version, deprecated: bool) {
        self.lower_since(version);
        self.deprecated = deprecated;
    }

    /// Lower `since` to `version` if that is earlier. Never raises it.
    pub fn lower_since(&mut self, version: Version) {
        self.since = self.since.min(version);
    }

    /// True when this fact held at or before the point `other` did.
    pub fn introduced_no_later_than(&self, other: &Element) -> bool {
        self.since <= other.since
    }
}

/// Insert a new fact under `key` or fold the observation into the existing one.
fn upsert(
    table: &mut BTreeMap<String, Element>,
    key: String,
    version: Version,
    deprecated: bool,
) {
    table
        .entry(key)
        .and_modify(|e| e.update(version, deprecated))
        .or_insert_with_key(|key| Element::new(key.clone(), version, deprecated));
}

/// Find the edge named `name` or append a new one.
fn find_or_append(edges: &mut Vec<Element>, name: &str, version: Version) {
    match edges.iter_mut().find(|e| e.name == name) {
        Some(edge) => edge.lower_since(version),
        None => edges.push(Element::new(name, version, false)),
    }
}

// ============================================================================
// Hidden state
// ============================================================================

/// Visibility history of a class as of its last observation.
///
/// A class that has been seen public once stays [`BecamePublic`]: later
/// hidden observations do not make it "always hidden" again.
///
/// [`BecamePublic`]: HiddenState::BecamePublic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "version", rename_all = "snake_case")]
pub enum HiddenState {
    /// No visibility observation yet. Treated as public.
    #[default]
    Unobserved,
    /// Never seen public; last seen non-public at this version.
    StillHidden(Version),
    /// Seen public; the version is the latest public observation.
    BecamePublic(Version),
}

/// A superclass edge taken off the visible chain, with the index it held
/// in `superclasses` when it was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RemovedEdge {
    pub(crate) position: usize,
    #[serde(flatten)]
    pub(crate) edge: Element,
}

/// Progress of hidden-ancestor flattening for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineState {
    #[default]
    Pending,
    InProgress,
    Done,
}

// ============================================================================
// ClassRecord
// ============================================================================

/// The full versioned picture of one class or interface.
///
/// Edges name other classes by string only. A name with no registry entry is
/// an unknown ancestor, never an error.
///
/// # Builder API
///
/// ```
/// use apilevels::v1::ClassRecord;
///
/// let dog = ClassRecord::new("Dog", 1, false)
///     .with_superclass("Animal", 1)
///     .with_interface("Pet", 3)
///     .with_method("bark()V", 1)
///     .with_field("name", 2);
///
/// assert_eq!(dog.superclasses()[0].name, "Animal");
/// assert_eq!(dog.method("bark()V").unwrap().since, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    #[serde(flatten)]
    pub(crate) element: Element,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) superclasses: Vec<Element>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) interfaces: Vec<Element>,
    #[serde(default)]
    pub(crate) hidden: HiddenState,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) fields: BTreeMap<String, Element>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) methods: BTreeMap<String, Element>,
    /// Hidden superclass edges taken off the visible chain. Flattening still
    /// walks them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) removed_superclasses: Vec<RemovedEdge>,
    #[serde(default)]
    pub(crate) inline_state: InlineState,
}

impl ClassRecord {
    /// Create a record for a class first observed at `since`
    pub fn new(name: impl Into<String>, since: Version, deprecated: bool) -> Self {
        Self {
            element: Element::new(name, since, deprecated),
            superclasses: Vec::new(),
            interfaces: Vec::new(),
            hidden: HiddenState::default(),
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
            removed_superclasses: Vec::new(),
            inline_state: InlineState::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }

    pub fn since(&self) -> Version {
        self.element.since
    }

    pub fn deprecated(&self) -> bool {
        self.element.deprecated
    }

    /// The class itself as a versioned fact.
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn superclasses(&self) -> &[Element] {
        &self.superclasses
    }

    pub fn interfaces(&self) -> &[Element] {
        &self.interfaces
    }

    pub fn fields(&self) -> &BTreeMap<String, Element> {
        &self.fields
    }

    pub fn methods(&self) -> &BTreeMap<String, Element> {
        &self.methods
    }

    pub fn field(&self, key: &str) -> Option<&Element> {
        self.fields.get(key)
    }

    pub fn method(&self, key: &str) -> Option<&Element> {
        self.methods.get(key)
    }

    /// Superclass edges dropped by hidden-superclass removal, oldest first.
    pub fn removed_superclasses(&self) -> impl Iterator<Item = &Element> {
        self.removed_superclasses.iter().map(|removed| &removed.edge)
    }

    pub fn hidden_state(&self) -> HiddenState {
        self.hidden
    }

    /// True iff the class has never been observed public.
    pub fn always_hidden(&self) -> bool {
        matches!(self.hidden, HiddenState::StillHidden(_))
    }

    /// True once hidden-ancestor flattening has completed for this class.
    pub fn is_inlined(&self) -> bool {
        self.inline_state == InlineState::Done
    }

    // ── Ingestion ────────────────────────────────────────────────────

    /// Fold another observation of the class itself into the record.
    pub fn update(&mut self, version: Version, deprecated: bool) {
        self.element.update(version, deprecated);
    }

    pub fn add_field(&mut self, name: &str, version: Version, deprecated: bool) {
        upsert(&mut self.fields, name.to_string(), version, deprecated);
    }

    /// Record a method observation. Keys ending in [`LEGACY_BUILDER_RETURN`]
    /// are rewritten to return this class.
    pub fn add_method(&mut self, name: &str, version: Version, deprecated: bool) {
        let key = self.method_key(name);
        upsert(&mut self.methods, key, version, deprecated);
    }

    fn method_key(&self, name: &str) -> String {
        match name.strip_suffix(LEGACY_BUILDER_RETURN) {
            Some(params) => format!("{})L{};", params, self.name()),
            None => name.to_string(),
        }
    }

    pub fn add_superclass(&mut self, name: &str, version: Version) {
        find_or_append(&mut self.superclasses, name, version);
    }

    pub fn add_interface(&mut self, name: &str, version: Version) {
        find_or_append(&mut self.interfaces, name, version);
    }

    /// Remove and return the superclass edge named `name`, if present.
    pub fn remove_superclass(&mut self, name: &str) -> Option<Element> {
        self.take_superclass(name).map(|(_, edge)| edge)
    }

    /// Remove the superclass edge named `name`, returning it with its index.
    pub(crate) fn take_superclass(&mut self, name: &str) -> Option<(usize, Element)> {
        let index = self.superclasses.iter().position(|e| e.name == name)?;
        Some((index, self.superclasses.remove(index)))
    }

    /// Record the visibility seen at `version`. Calls must arrive in
    /// increasing version order.
    ///
    /// This is not "latest observation wins". Once the class has been seen
    /// public, a later hidden observation is logged and ignored, so
    /// [`always_hidden`](Self::always_hidden) only holds for classes never
    /// seen public.
    pub fn update_hidden(&mut self, version: Version, hidden: bool) {
        self.hidden = match (self.hidden, hidden) {
            (HiddenState::BecamePublic(public), true) => {
                warn!(
                    class = %self.name(),
                    public,
                    version,
                    "class observed hidden after being public"
                );
                HiddenState::BecamePublic(public)
            }
            (_, true) => HiddenState::StillHidden(version),
            (_, false) => HiddenState::BecamePublic(version),
        };
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Add a superclass edge
    pub fn with_superclass(mut self, name: &str, since: Version) -> Self {
        self.add_superclass(name, since);
        self
    }

    /// Add an interface edge
    pub fn with_interface(mut self, name: &str, since: Version) -> Self {
        self.add_interface(name, since);
        self
    }

    /// Add a non-deprecated field
    pub fn with_field(mut self, name: &str, since: Version) -> Self {
        self.add_field(name, since, false);
        self
    }

    /// Add a non-deprecated method
    pub fn with_method(mut self, name: &str, since: Version) -> Self {
        self.add_method(name, since, false);
        self
    }

    /// Mark the class hidden as of `version`
    pub fn hidden_at(mut self, version: Version) -> Self {
        self.update_hidden(version, true);
        self
    }
}
