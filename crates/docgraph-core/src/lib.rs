//! Core of docgraph: documentation identifiers, element graph, and
//! `<inheritdoc>` resolution.
//!
//! This crate provides:
//! - Identifier encoding and decoding for types and members
//! - The metadata model and provider trait
//! - Documentation fragments, stores, and content selectors
//! - The element graph built from a provider and a store
//! - The inheritance resolver
//! - Error types and error codes

pub mod docid;
pub mod error;
pub mod fragment;
pub mod graph;
pub mod model;
pub mod provider;
pub mod resolve;
pub mod selector;
pub mod store;

use crate::error::GraphError;
use crate::graph::ElementGraph;
use crate::provider::MetadataProvider;
use crate::resolve::{InheritanceResolver, ResolveOptions, ResolvedDocs};
use crate::store::DocStore;

/// Build the element graph and resolve every element in one call.
pub fn resolve_documentation(
    provider: &dyn MetadataProvider,
    store: &DocStore,
    options: ResolveOptions,
) -> Result<ResolvedDocs, GraphError> {
    let graph = ElementGraph::build(provider, store)?;
    Ok(InheritanceResolver::with_options(&graph, options).resolve_all())
}
