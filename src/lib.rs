//! docgraph: resolve `<inheritdoc>` across a type hierarchy.
//!
//! Builds an identifier-indexed graph of declared types and members, then
//! replaces every inheritance placeholder in their documentation with content
//! pulled from base types, interfaces, or explicitly referenced elements.

// Core - re-exported from docgraph-core
pub use docgraph_core::docid;
pub use docgraph_core::error;
pub use docgraph_core::fragment;
pub use docgraph_core::graph;
pub use docgraph_core::model;
pub use docgraph_core::provider;
pub use docgraph_core::resolve;
pub use docgraph_core::resolve_documentation;
pub use docgraph_core::selector;
pub use docgraph_core::store;

// Front door
pub mod cli;
pub mod output;
