//! Render cleaned apilevels registries as api-versions XML manifests.
//!
//! Every class that was ever public becomes a `<class>` block. Inside it,
//! nested tags always come in the same order: `<extends>`, `<implements>`,
//! `<method>`, `<field>`. Edges keep their recorded order; methods and
//! fields are sorted by key. Each tag carries its own `since` and, when set,
//! `deprecated="true"`.
//!
//! # Example
//!
//! ```
//! use apilevels::v1::{ClassRecord, Registry};
//! use apilevels_xml::{render, RenderOptions};
//!
//! let mut registry = Registry::new();
//! registry.insert(ClassRecord::new("java/lang/Thread", 1, false)
//!     .with_superclass("java/lang/Object", 1)
//!     .with_interface("java/lang/Runnable", 1)
//!     .with_method("run()V", 1));
//!
//! let xml = render(&registry, &RenderOptions::default());
//! assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<api version=\"2\">\n"));
//! assert!(xml.contains("\t<class name=\"java/lang/Thread\" since=\"1\">\n"));
//! assert!(xml.contains("\t\t<method name=\"run()V\" since=\"1\"/>\n"));
//! ```
//!
//! Pipe the CLI output straight to a file consumers read:
//!
//! ```bash
//! apilevels generate --input observations.jsonl --output api-versions.xml
//! ```

use apilevels::v1::{ClassRecord, Element, Registry, Version, query};

/// Options controlling the manifest layout.
pub struct RenderOptions {
    /// Value of the root `<api version="...">` attribute.
    pub api_version: u32,
    /// Omit `since` on a nested tag when it is not later than its class's.
    pub elide_inherited_since: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            api_version: 2,
            elide_inherited_since: false,
        }
    }
}

/// Render every public class in `registry` as one XML document.
pub fn render(registry: &Registry, options: &RenderOptions) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!("<api version=\"{}\">\n", options.api_version));
    for class in query::public_classes(registry) {
        xml.push_str(&render_class(class, options));
    }
    xml.push_str("</api>\n");
    xml
}

/// Render one class block. Returns an empty string for always-hidden classes.
pub fn render_class(class: &ClassRecord, options: &RenderOptions) -> String {
    if class.always_hidden() {
        return String::new();
    }

    let mut xml = String::new();
    xml.push('\t');
    xml.push_str(&open_tag("class", class.element(), None));
    xml.push_str(">\n");

    let parent = options.elide_inherited_since.then(|| class.since());
    let sections: [(&str, Vec<&Element>); 4] = [
        ("extends", class.superclasses().iter().collect()),
        ("implements", class.interfaces().iter().collect()),
        ("method", class.methods().values().collect()),
        ("field", class.fields().values().collect()),
    ];
    for (tag, elements) in sections {
        for element in elements {
            xml.push_str("\t\t");
            xml.push_str(&open_tag(tag, element, parent));
            xml.push_str("/>\n");
        }
    }

    xml.push_str("\t</class>\n");
    xml
}

/// `<tag name=".." since=".." deprecated="true"` without the closing bracket.
fn open_tag(tag: &str, element: &Element, parent_since: Option<Version>) -> String {
    let mut out = format!("<{} name=\"{}\"", tag, escape_xml(&element.name));
    if parent_since.is_none_or(|parent| element.since > parent) {
        out.push_str(&format!(" since=\"{}\"", element.since));
    }
    if element.deprecated {
        out.push_str(" deprecated=\"true\"");
    }
    out
}

/// Escape a string for use in a double-quoted XML attribute.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
