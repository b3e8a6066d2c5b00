//! Observation batches produced by a per-version scanner.

use crate::error::{Error, Result};
use crate::types::Version;
use serde::{Deserialize, Serialize};

/// Everything a scanner saw in one released version of the library.
///
/// Snapshots are fed to a registry in non-decreasing version order.
///
/// # JSON shape
///
/// ```json
/// {
///   "version": 3,
///   "classes": [
///     {
///       "name": "java/util/ArrayList",
///       "superclasses": ["java/util/AbstractList"],
///       "interfaces": ["java/util/List", "java/util/RandomAccess"],
///       "methods": [{ "name": "<init>()V" }, { "name": "trimToSize()V" }],
///       "fields": []
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: Version,
    #[serde(default)]
    pub classes: Vec<ClassObservation>,
}

/// One class as seen in a single snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassObservation {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Non-public in this snapshot (package-private or otherwise filtered).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superclasses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<MemberObservation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MemberObservation>,
}

/// A field or method signature as seen in a single snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberObservation {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Snapshot {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            classes: Vec::new(),
        }
    }

    /// Add a class observation
    pub fn with_class(mut self, class: ClassObservation) -> Self {
        self.classes.push(class);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse one snapshot per non-blank line.
    pub fn parse_jsonl(jsonl: &str) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        for (index, line) in jsonl.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let snapshot = serde_json::from_str(line).map_err(|source| Error::JsonLine {
                line: index + 1,
                source,
            })?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    /// Serialize snapshots as JSONL (one [`Snapshot`] per line).
    pub fn to_jsonl(snapshots: &[Snapshot]) -> Result<String> {
        let mut buf = String::new();
        for snapshot in snapshots {
            buf.push_str(&serde_json::to_string(snapshot)?);
            buf.push('\n');
        }
        Ok(buf)
    }
}

impl ClassObservation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Mark the class non-public in this snapshot
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark the class deprecated in this snapshot
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclasses.push(name.into());
        self
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(MemberObservation::new(name));
        self
    }

    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(MemberObservation::new(name));
        self
    }

    pub fn with_deprecated_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(MemberObservation {
            name: name.into(),
            deprecated: true,
        });
        self
    }
}

impl MemberObservation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deprecated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_minimal_json() {
        let snap = Snapshot::from_json(r#"{"version":1,"classes":[{"name":"A"}]}"#).unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.classes[0].name, "A");
        assert!(!snap.classes[0].hidden);
        assert!(snap.classes[0].methods.is_empty());
    }

    #[test]
    fn test_snapshot_without_classes() {
        let snap = Snapshot::from_json(r#"{"version":7}"#).unwrap();
        assert!(snap.classes.is_empty());
    }

    #[test]
    fn test_snapshot_to_json_skips_defaults() {
        let snap = Snapshot::new(2).with_class(ClassObservation::new("A"));
        let json = snap.to_json().unwrap();
        assert_eq!(json, r#"{"version":2,"classes":[{"name":"A"}]}"#);
    }

    #[test]
    fn test_parse_jsonl_skips_blank_lines() {
        let jsonl = "{\"version\":1}\n\n  \n{\"version\":2}\n";
        let snaps = Snapshot::parse_jsonl(jsonl).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[1].version, 2);
    }

    #[test]
    fn test_parse_jsonl_reports_line() {
        let jsonl = "{\"version\":1}\nnot json\n";
        match Snapshot::parse_jsonl(jsonl) {
            Err(Error::JsonLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected JsonLine error, got {:?}", other),
        }
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let snaps = vec![
            Snapshot::new(1).with_class(
                ClassObservation::new("A")
                    .with_superclass("java/lang/Object")
                    .with_method("<init>()V"),
            ),
            Snapshot::new(2).with_class(
                ClassObservation::new("A")
                    .deprecated()
                    .with_deprecated_method("old()V"),
            ),
        ];
        let jsonl = Snapshot::to_jsonl(&snaps).unwrap();
        assert_eq!(jsonl.lines().count(), 2);
        let parsed = Snapshot::parse_jsonl(&jsonl).unwrap();
        assert!(parsed[1].classes[0].deprecated);
        assert!(parsed[1].classes[0].methods[0].deprecated);
        assert_eq!(parsed[0].classes[0].superclasses, vec!["java/lang/Object"]);
    }
}
