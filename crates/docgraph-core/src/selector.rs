//! Content selectors for `<inheritdoc path="...">`.
//!
//! A selector is an XPath 1.0 expression evaluated with the target's content
//! root (the `<member>` element wrapping its fragment) as context node. The
//! matched nodes become the inherited content:
//!
//! - an element is copied as-is, except the content root itself, which
//!   contributes its children;
//! - a text node or an attribute contributes its text;
//! - the document root contributes the whole fragment.
//!
//! Expressions that fail to parse or evaluate, and expressions whose value
//! is not a node-set, select nothing.

use sxd_document::{dom, Package};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};
use tracing::{debug, warn};

use crate::fragment::{append_nodes, convert_children, convert_element, DocNode, Fragment, CONTENT_ROOT_TAG};

/// Evaluate `expr` against `fragment` and return the selected nodes.
///
/// A blank expression selects the whole fragment.
pub fn select(fragment: &Fragment, expr: &str) -> Vec<DocNode> {
    let expr = expr.trim();
    if expr.is_empty() {
        return fragment.nodes().to_vec();
    }

    let xpath = match Factory::new().build(expr) {
        Ok(Some(xpath)) => xpath,
        Ok(None) => {
            debug!(expr, "empty selector");
            return Vec::new();
        }
        Err(err) => {
            warn!(expr, error = ?err, "selector does not parse, selecting nothing");
            return Vec::new();
        }
    };

    let package = Package::new();
    let document = package.as_document();
    let content_root = document.create_element(CONTENT_ROOT_TAG);
    document.root().append_child(content_root);
    append_nodes(&document, content_root, fragment.nodes());

    let context = Context::new();
    let value = match xpath.evaluate(&context, content_root) {
        Ok(value) => value,
        Err(err) => {
            warn!(expr, error = ?err, "selector failed to evaluate, selecting nothing");
            return Vec::new();
        }
    };

    match value {
        Value::Nodeset(nodes) => {
            let mut out = Vec::new();
            for node in nodes.document_order() {
                collect(node, fragment, &mut out);
            }
            debug!(expr, selected = out.len(), "selector evaluated");
            out
        }
        other => {
            debug!(expr, value = ?other, "selector did not produce nodes");
            Vec::new()
        }
    }
}

fn collect(node: Node<'_>, fragment: &Fragment, out: &mut Vec<DocNode>) {
    match node {
        Node::Element(element) if is_content_root(element) => out.extend(convert_children(element)),
        Node::Element(element) => out.push(DocNode::Element(convert_element(element))),
        Node::Text(text) => out.push(DocNode::text(text.text())),
        Node::Attribute(attr) => out.push(DocNode::text(attr.value())),
        Node::Root(_) => out.extend(fragment.nodes().iter().cloned()),
        _ => {}
    }
}

fn is_content_root(element: dom::Element<'_>) -> bool {
    matches!(element.parent(), Some(dom::ParentOfChild::Root(_)))
}

// ============================================================================
// Tests
// ============================================================================
