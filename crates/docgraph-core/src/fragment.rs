//! Documentation fragments: the structured content attached to one element.
//!
//! A [`Fragment`] is an ordered list of [`DocNode`]s, the children of the
//! store's `<member>` element. Fragments are immutable values; resolving
//! placeholders produces a new fragment ([`Fragment::map_placeholders`]) and
//! never edits a shared tree.
//!
//! # Placeholders
//!
//! An `<inheritdoc/>` element anywhere in the tree is a [`Placeholder`]. It
//! may carry a `cref` attribute (explicit target identifier) and a `path`
//! attribute (content selector). Anything nested inside a placeholder is
//! ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use sxd_document::writer::Writer;
use sxd_document::{dom, parser, Package};
use tracing::warn;

use crate::error::FragmentError;

/// Tag of the inheritance placeholder element.
pub const INHERITDOC_TAG: &str = "inheritdoc";
/// Placeholder attribute naming an explicit target.
pub const CREF_ATTR: &str = "cref";
/// Placeholder attribute holding a content selector.
pub const PATH_ATTR: &str = "path";
/// Tag of the element wrapping one element's documentation.
pub const CONTENT_ROOT_TAG: &str = "member";

/// Declaration the writer puts in front of every document.
const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

// ============================================================================
// Nodes
// ============================================================================

/// A node in a documentation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocNode {
    Element(DocElement),
    Text(String),
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocNode>,
}

impl DocElement {
    /// Create an element with no attributes.
    pub fn new(tag: impl Into<String>, children: Vec<DocNode>) -> Self {
        DocElement {
            tag: tag.into(),
            attributes: Vec::new(),
            children,
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Value of the attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element is an inheritance placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.tag == INHERITDOC_TAG
    }
}

impl DocNode {
    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        DocNode::Text(text.into())
    }

    /// An element node without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<DocNode>) -> Self {
        DocNode::Element(DocElement::new(tag, children))
    }

    /// The element, if this is one.
    pub fn as_element(&self) -> Option<&DocElement> {
        match self {
            DocNode::Element(element) => Some(element),
            DocNode::Text(_) => None,
        }
    }

    /// Whitespace-only text, which carries no content.
    pub fn is_blank(&self) -> bool {
        match self {
            DocNode::Text(text) => text.trim().is_empty(),
            DocNode::Element(_) => false,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &DocNode, out: &mut String) {
    match node {
        DocNode::Text(text) => out.push_str(text),
        DocNode::Element(element) => {
            for child in &element.children {
                collect_text(child, out);
            }
        }
    }
}

// ============================================================================
// Placeholders
// ============================================================================

/// An `<inheritdoc>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placeholder {
    /// Explicit target identifier, kind-tagged or bare.
    pub cref: Option<String>,
    /// Content selector evaluated against the target's content.
    pub path: Option<String>,
}

impl Placeholder {
    /// Read a placeholder from its element; blank attributes count as absent.
    pub fn from_element(element: &DocElement) -> Self {
        let read = |name: &str| {
            element
                .attribute(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Placeholder {
            cref: read(CREF_ATTR),
            path: read(PATH_ATTR),
        }
    }

    /// Whether the target comes from the inheritance hierarchy.
    pub fn is_implicit(&self) -> bool {
        self.cref.is_none()
    }
}

// ============================================================================
// Fragment
// ============================================================================

/// The documentation of one element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    nodes: Vec<DocNode>,
}

impl Fragment {
    /// Create a fragment from nodes.
    pub fn new(nodes: Vec<DocNode>) -> Self {
        Fragment { nodes }
    }

    /// A fragment with no content.
    pub fn empty() -> Self {
        Fragment::default()
    }

    /// A fragment holding a single bare `<inheritdoc/>`.
    pub fn implicit_placeholder() -> Self {
        Fragment::new(vec![DocNode::element(INHERITDOC_TAG, Vec::new())])
    }

    /// Parse the inner XML of a `<member>` element.
    pub fn parse(xml: &str) -> Result<Self, FragmentError> {
        let wrapped = format!("<{tag}>{xml}</{tag}>", tag = CONTENT_ROOT_TAG);
        let package = parser::parse(&wrapped).map_err(|err| FragmentError::Malformed {
            message: format!("{:?}", err),
        })?;
        let document = package.as_document();
        let nodes = document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                dom::ChildOfRoot::Element(element) => Some(convert_children(element)),
                _ => None,
            })
            .unwrap_or_default();
        Ok(Fragment::new(nodes))
    }

    /// Top-level nodes.
    pub fn nodes(&self) -> &[DocNode] {
        &self.nodes
    }

    /// Consume into top-level nodes.
    pub fn into_nodes(self) -> Vec<DocNode> {
        self.nodes
    }

    /// True when there is nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(DocNode::is_blank)
    }

    /// First top-level element with the given tag.
    pub fn find(&self, tag: &str) -> Option<&DocElement> {
        self.nodes
            .iter()
            .filter_map(DocNode::as_element)
            .find(|element| element.tag == tag)
    }

    /// Whether any placeholder occurs anywhere in the tree.
    pub fn has_placeholders(&self) -> bool {
        fn any(nodes: &[DocNode]) -> bool {
            nodes.iter().any(|node| match node {
                DocNode::Element(element) => element.is_placeholder() || any(&element.children),
                DocNode::Text(_) => false,
            })
        }
        any(&self.nodes)
    }

    /// Every placeholder, in document order.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        fn walk(nodes: &[DocNode], out: &mut Vec<Placeholder>) {
            for node in nodes {
                if let DocNode::Element(element) = node {
                    if element.is_placeholder() {
                        out.push(Placeholder::from_element(element));
                    } else {
                        walk(&element.children, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// A copy of this fragment with every placeholder replaced by the nodes
    /// `replace` returns for it (possibly none).
    pub fn map_placeholders<F>(&self, mut replace: F) -> Fragment
    where
        F: FnMut(&Placeholder) -> Vec<DocNode>,
    {
        Fragment::new(map_nodes(&self.nodes, &mut replace))
    }

    /// Concatenated text content.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            collect_text(node, &mut out);
        }
        out
    }

    /// Serialize back to XML (the inner XML of a `<member>` element).
    pub fn to_xml(&self) -> String {
        let package = Package::new();
        let document = package.as_document();
        let root = document.create_element(CONTENT_ROOT_TAG);
        append_nodes(&document, root, &self.nodes);
        document.root().append_child(root);

        let xml = write_document(&document);
        let open = format!("<{}>", CONTENT_ROOT_TAG);
        let close = format!("</{}>", CONTENT_ROOT_TAG);
        xml.strip_prefix(XML_DECLARATION)
            .and_then(|body| body.strip_prefix(open.as_str()))
            .and_then(|body| body.strip_suffix(close.as_str()))
            .unwrap_or_default()
            .to_string()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn map_nodes<F>(nodes: &[DocNode], replace: &mut F) -> Vec<DocNode>
where
    F: FnMut(&Placeholder) -> Vec<DocNode>,
{
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            DocNode::Element(element) if element.is_placeholder() => {
                out.extend(replace(&Placeholder::from_element(element)));
            }
            DocNode::Element(element) => out.push(DocNode::Element(DocElement {
                tag: element.tag.clone(),
                attributes: element.attributes.clone(),
                children: map_nodes(&element.children, replace),
            })),
            DocNode::Text(text) => out.push(DocNode::Text(text.clone())),
        }
    }
    out
}

// ============================================================================
// XML Conversion
// ============================================================================

/// Convert the children of a DOM element into owned nodes.
///
/// Comments and processing instructions are dropped.
pub(crate) fn convert_children(element: dom::Element<'_>) -> Vec<DocNode> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            dom::ChildOfElement::Element(inner) => Some(DocNode::Element(convert_element(inner))),
            dom::ChildOfElement::Text(text) => Some(DocNode::Text(text.text().to_string())),
            _ => None,
        })
        .collect()
}

/// Convert a DOM element into an owned element.
pub(crate) fn convert_element(element: dom::Element<'_>) -> DocElement {
    DocElement {
        tag: element.name().local_part().to_string(),
        attributes: element
            .attributes()
            .into_iter()
            .map(|attr| (attr.name().local_part().to_string(), attr.value().to_string()))
            .collect(),
        children: convert_children(element),
    }
}

/// Append owned nodes under a DOM element.
pub(crate) fn append_nodes<'d>(document: &dom::Document<'d>, parent: dom::Element<'d>, nodes: &[DocNode]) {
    for node in nodes {
        match node {
            DocNode::Element(element) => {
                let child = document.create_element(element.tag.as_str());
                for (name, value) in &element.attributes {
                    child.set_attribute_value(name.as_str(), value.as_str());
                }
                append_nodes(document, child, &element.children);
                parent.append_child(child);
            }
            DocNode::Text(text) => parent.append_child(document.create_text(text)),
        }
    }
}

/// Serialize a whole document, declaration included, with double-quoted
/// attributes.
pub(crate) fn write_document(document: &dom::Document<'_>) -> String {
    let mut out = Vec::new();
    if let Err(err) = Writer::new().set_single_quotes(false).format_document(document, &mut out) {
        warn!(error = %err, "failed to write XML document");
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ============================================================================
// Tests
// ============================================================================
