//! Metadata provider trait and the bundled JSON model.
//!
//! A [`MetadataProvider`] supplies the declared types of the analyzed set.
//! The element graph reads it once while building and never calls it again,
//! so a provider can be as simple as a vector of [`TypeDecl`]s.
//!
//! # Index References
//!
//! Types refer to their declaring type by index into
//! [`MetadataProvider::declared_types`]; the order of that slice must be
//! stable for the lifetime of the provider. Base types and interfaces are
//! [`TypeRef`](crate::model::TypeRef)s and may name types the provider does
//! not declare; those are simply not part of the graph.
//!
//! # Bundled Model
//!
//! [`ModelBundle`] is the provider the CLI uses. It deserializes from JSON:
//!
//! ```
//! use docgraph_core::provider::{MetadataProvider, ModelBundle};
//!
//! let bundle = ModelBundle::from_json(r#"{
//!     "assembly": "Acme",
//!     "types": [
//!         { "name": "Widget", "namespace": "Acme",
//!           "members": [ { "name": "Run", "kind": "method", "params": [] } ] }
//!     ]
//! }"#).unwrap();
//! assert_eq!(bundle.declared_types().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::model::TypeDecl;

/// Source of declared types and members.
pub trait MetadataProvider {
    /// All declared types, in a stable order.
    fn declared_types(&self) -> &[TypeDecl];

    /// Name of the assembly the types belong to, if known.
    fn assembly_name(&self) -> Option<&str> {
        None
    }
}

/// An in-memory model, usually loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl ModelBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the assembly name.
    pub fn with_assembly(mut self, name: impl Into<String>) -> Self {
        self.assembly = Some(name.into());
        self
    }

    /// Add a type and return its index (for `nested_in`).
    pub fn push_type(&mut self, decl: TypeDecl) -> usize {
        self.types.push(decl);
        self.types.len() - 1
    }

    /// Parse a bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl MetadataProvider for ModelBundle {
    fn declared_types(&self) -> &[TypeDecl] {
        &self.types
    }

    fn assembly_name(&self) -> Option<&str> {
        self.assembly.as_deref()
    }
}

impl MetadataProvider for Vec<TypeDecl> {
    fn declared_types(&self) -> &[TypeDecl] {
        self
    }
}
