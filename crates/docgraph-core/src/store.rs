//! Documentation store: fragments keyed by qualified identifier.
//!
//! The on-disk layout is the usual documentation file:
//!
//! ```xml
//! <doc>
//!   <assembly><name>Acme</name></assembly>
//!   <members>
//!     <member name="T:Acme.Widget"><summary>...</summary></member>
//!     <member name="M:Acme.Widget.Run(System.String)">...</member>
//!   </members>
//! </doc>
//! ```
//!
//! Several files can be merged into one store; a later entry for the same
//! identifier replaces an earlier one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sxd_document::{dom, parser, Package};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::fragment::{append_nodes, convert_children, write_document, Fragment, CONTENT_ROOT_TAG};

const DOC_TAG: &str = "doc";
const ASSEMBLY_TAG: &str = "assembly";
const NAME_TAG: &str = "name";
const MEMBERS_TAG: &str = "members";
const NAME_ATTR: &str = "name";

/// Documentation fragments indexed by qualified identifier (`T:`, `M:`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocStore {
    assembly: Option<String>,
    entries: BTreeMap<String, Fragment>,
}

impl DocStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a documentation file from its text.
    pub fn parse(xml: &str) -> Result<Self, StoreError> {
        let package = parser::parse(xml).map_err(|err| StoreError::Malformed {
            message: format!("{:?}", err),
        })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                dom::ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
            .ok_or_else(|| StoreError::Malformed {
                message: "document has no root element".to_string(),
            })?;

        let root_tag = root.name().local_part();
        if root_tag != DOC_TAG {
            return Err(StoreError::UnexpectedRoot {
                found: root_tag.to_string(),
            });
        }

        let mut store = DocStore::new();
        for section in child_elements(root) {
            match section.name().local_part() {
                ASSEMBLY_TAG => {
                    store.assembly = child_elements(section)
                        .find(|el| el.name().local_part() == NAME_TAG)
                        .map(element_text)
                        .filter(|name| !name.is_empty());
                }
                MEMBERS_TAG => {
                    for member in child_elements(section) {
                        store.read_member(member);
                    }
                }
                other => debug!(tag = other, "ignoring unknown section"),
            }
        }
        Ok(store)
    }

    /// Read and parse a documentation file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::parse(&text)?;
        debug!(path = %path.display(), entries = store.len(), "loaded documentation file");
        Ok(store)
    }

    fn read_member(&mut self, member: dom::Element<'_>) {
        if member.name().local_part() != CONTENT_ROOT_TAG {
            debug!(tag = member.name().local_part(), "ignoring non-member element");
            return;
        }
        match member.attribute_value(NAME_ATTR).map(str::trim) {
            Some(name) if !name.is_empty() => {
                self.insert(name, Fragment::new(convert_children(member)));
            }
            _ => warn!("skipping <member> without a name"),
        }
    }

    /// Merge `other` into this store; its entries win.
    pub fn merge(&mut self, other: DocStore) {
        if other.assembly.is_some() {
            self.assembly = other.assembly;
        }
        self.entries.extend(other.entries);
    }

    /// Insert or replace the fragment for `id`.
    pub fn insert(&mut self, id: impl Into<String>, fragment: Fragment) {
        self.entries.insert(id.into(), fragment);
    }

    /// Fragment stored for the qualified identifier `id`.
    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.entries.get(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.entries.iter().map(|(id, fragment)| (id.as_str(), fragment))
    }

    /// Assembly name from the file header, if any.
    pub fn assembly_name(&self) -> Option<&str> {
        self.assembly.as_deref()
    }

    /// Set the assembly name.
    pub fn set_assembly_name(&mut self, name: impl Into<String>) {
        self.assembly = Some(name.into());
    }

    /// Serialize in the documentation file layout.
    pub fn to_xml(&self) -> String {
        write_doc_file(self.assembly_name(), self.iter())
    }
}

fn child_elements<'d>(element: dom::Element<'d>) -> impl Iterator<Item = dom::Element<'d>> {
    element.children().into_iter().filter_map(|child| match child {
        dom::ChildOfElement::Element(el) => Some(el),
        _ => None,
    })
}

fn element_text(element: dom::Element<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        if let dom::ChildOfElement::Text(text) = child {
            out.push_str(text.text());
        }
    }
    out.trim().to_string()
}

/// Write entries as a documentation file, one `<member>` per line.
pub fn write_doc_file<'a, I>(assembly: Option<&str>, entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Fragment)>,
{
    let package = Package::new();
    let document = package.as_document();
    let indent = |depth: usize| document.create_text(&format!("\n{}", "  ".repeat(depth)));

    let doc = document.create_element(DOC_TAG);
    document.root().append_child(doc);
    if let Some(name) = assembly {
        let assembly_el = document.create_element(ASSEMBLY_TAG);
        let name_el = document.create_element(NAME_TAG);
        name_el.append_child(document.create_text(name));
        assembly_el.append_child(name_el);
        doc.append_child(indent(1));
        doc.append_child(assembly_el);
    }

    let members = document.create_element(MEMBERS_TAG);
    for (id, fragment) in entries {
        let member = document.create_element(CONTENT_ROOT_TAG);
        member.set_attribute_value(NAME_ATTR, id);
        append_nodes(&document, member, fragment.nodes());
        members.append_child(indent(2));
        members.append_child(member);
    }
    members.append_child(indent(1));
    doc.append_child(indent(1));
    doc.append_child(members);
    doc.append_child(indent(0));

    let mut xml = write_document(&document);
    xml.push('\n');
    xml
}

// ============================================================================
// Tests
// ============================================================================
