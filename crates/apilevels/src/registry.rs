use crate::error::{Error, Result};
use crate::snapshot::{ClassObservation, Snapshot};
use crate::types::{ClassRecord, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Every known class, keyed by name.
///
/// The registry owns its records. Edges between records are plain names, so
/// lookups for classes that were never observed simply return `None`.
///
/// # Example: ingest two versions and clean
///
/// ```
/// use apilevels::v1::{ClassObservation, Registry, Snapshot};
///
/// let mut registry = Registry::new();
/// registry.ingest(&Snapshot::new(1).with_class(
///     ClassObservation::new("Dog").with_method("bark()V"),
/// )).unwrap();
/// registry.ingest(&Snapshot::new(5).with_class(
///     ClassObservation::new("Puppy")
///         .with_superclass("Dog")
///         .with_method("bark()V"),
/// )).unwrap();
///
/// let stats = registry.clean().unwrap();
/// assert_eq!(stats.overriding_methods_removed, 1);
/// assert!(registry.get("Puppy").unwrap().method("bark()V").is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub(crate) classes: BTreeMap<String, ClassRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_version: Option<Version>,
}

/// Settings for [`Registry::clean_with`].
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Run the decide step of each read-only pass on the rayon pool.
    pub parallel: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// What each closure pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub hidden_superclasses_removed: usize,
    pub members_inlined: usize,
    pub implicit_interfaces_removed: usize,
    pub overriding_methods_removed: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ClassRecord> {
        self.classes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassRecord> {
        self.classes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Records in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.values()
    }

    /// Highest snapshot version ingested so far.
    pub fn last_version(&self) -> Option<Version> {
        self.last_version
    }

    /// Insert a prebuilt record, replacing any record with the same name.
    pub fn insert(&mut self, record: ClassRecord) -> Option<ClassRecord> {
        self.classes.insert(record.name().to_string(), record)
    }

    /// Fetch the record for `name`, creating it at `version` if absent, and
    /// fold in this observation of the class.
    pub fn class(&mut self, name: &str, version: Version, deprecated: bool) -> &mut ClassRecord {
        self.classes
            .entry(name.to_string())
            .and_modify(|record| record.update(version, deprecated))
            .or_insert_with(|| ClassRecord::new(name, version, deprecated))
    }

    // ── Ingestion ────────────────────────────────────────────────────

    /// Apply one version's observations.
    ///
    /// Fails with [`Error::VersionRegression`] if `snapshot` is older than a
    /// version already ingested. Repeating the latest version is allowed.
    pub fn ingest(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(previous) = self.last_version
            && snapshot.version < previous
        {
            return Err(Error::VersionRegression {
                previous,
                found: snapshot.version,
            });
        }
        self.last_version = Some(snapshot.version);
        for observation in &snapshot.classes {
            self.observe(snapshot.version, observation);
        }
        debug!(
            version = snapshot.version,
            classes = snapshot.classes.len(),
            "ingested snapshot"
        );
        Ok(())
    }

    fn observe(&mut self, version: Version, observation: &ClassObservation) {
        let record = self.class(&observation.name, version, observation.deprecated);
        record.update_hidden(version, observation.hidden);
        for superclass in &observation.superclasses {
            record.add_superclass(superclass, version);
        }
        for interface in &observation.interfaces {
            record.add_interface(interface, version);
        }
        for field in &observation.fields {
            record.add_field(&field.name, version, field.deprecated);
        }
        for method in &observation.methods {
            record.add_method(&method.name, version, method.deprecated);
        }
    }

    /// Apply every snapshot in a JSONL document, in order. Returns the number
    /// of snapshots applied.
    ///
    /// A malformed line fails before anything is applied. A version
    /// regression fails at that snapshot, and the registry keeps every
    /// snapshot applied before it.
    pub fn ingest_jsonl(&mut self, jsonl: &str) -> Result<usize> {
        let snapshots = Snapshot::parse_jsonl(jsonl)?;
        for snapshot in &snapshots {
            self.ingest(snapshot)?;
        }
        Ok(snapshots.len())
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Run the closure passes with default options. See [`Registry::clean_with`].
    pub fn clean(&mut self) -> Result<CleanStats> {
        self.clean_with(&CleanOptions::default())
    }

    /// Run the four closure passes once over every record.
    ///
    /// The order is fixed, and every record finishes one pass before any
    /// record starts the next:
    ///
    /// 1. hidden superclass removal
    /// 2. hidden ancestor flattening
    /// 3. implicit interface elision
    /// 4. override elision
    pub fn clean_with(&mut self, options: &CleanOptions) -> Result<CleanStats> {
        let stats = CleanStats {
            hidden_superclasses_removed: self.remove_hidden_superclasses(options.parallel),
            members_inlined: self.inline_from_hidden_ancestors()?,
            implicit_interfaces_removed: self.remove_implicit_interfaces(options.parallel),
            overriding_methods_removed: self.remove_overriding_methods(options.parallel),
        };
        info!(
            classes = self.len(),
            hidden_superclasses = stats.hidden_superclasses_removed,
            inlined = stats.members_inlined,
            implicit_interfaces = stats.implicit_interfaces_removed,
            overriding_methods = stats.overriding_methods_removed,
            "registry cleaned"
        );
        Ok(stats)
    }

    // ── JSON ─────────────────────────────────────────────────────────

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
