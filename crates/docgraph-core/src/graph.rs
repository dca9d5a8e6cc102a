//! Element graph: every declared type and member, indexed by identifier.
//!
//! The graph is an arena. Types and members live in two vectors and refer to
//! each other through [`TypeHandle`] and [`MemberHandle`] indices; parent
//! edges are handle lists, never references. It is built once from a
//! [`MetadataProvider`] and a [`DocStore`] and is read-only afterward.
//!
//! # Identifiers
//!
//! Every element's identifier is computed while building, through
//! [`crate::docid`]. Type identifiers must be unique in the graph and member
//! identifiers unique within their declaring type; a violation is a
//! [`GraphError`] and no graph is produced.
//!
//! # Parents
//!
//! A type's parents are its base type followed by its interfaces in
//! declaration order, restricted to types present in the graph. A base or
//! interface the provider does not declare ends the chain at that edge.
//!
//! # Documentation
//!
//! The raw fragment of an element comes from the store entry for its
//! kind-tagged identifier. Only when the store has none is the provider's
//! own fragment text parsed; text that is not well-formed is logged and
//! dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::docid::{
    definition_id, erase_encloser_arity, member_id, qualified_id, split_member_cref, split_qualified,
    type_id, GenericContext, IdKind,
};
use crate::error::GraphError;
use crate::fragment::Fragment;
use crate::model::{GenericParamDecl, MemberKind, MemberShape, TypeDecl, TypeKind};
use crate::provider::MetadataProvider;
use crate::store::DocStore;

// ============================================================================
// Handles
// ============================================================================

/// Index of a declared type in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TypeHandle(pub u32);

impl TypeHandle {
    /// Create a new type handle.
    pub fn new(index: u32) -> Self {
        TypeHandle(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type_{}", self.0)
    }
}

/// Index of a member in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct MemberHandle(pub u32);

impl MemberHandle {
    /// Create a new member handle.
    pub fn new(index: u32) -> Self {
        MemberHandle(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MemberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member_{}", self.0)
    }
}

/// Either kind of element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum ElementHandle {
    Type(TypeHandle),
    Member(MemberHandle),
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementHandle::Type(handle) => write!(f, "{}", handle),
            ElementHandle::Member(handle) => write!(f, "{}", handle),
        }
    }
}

impl From<TypeHandle> for ElementHandle {
    fn from(handle: TypeHandle) -> Self {
        ElementHandle::Type(handle)
    }
}

impl From<MemberHandle> for ElementHandle {
    fn from(handle: MemberHandle) -> Self {
        ElementHandle::Member(handle)
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A declared type in the graph.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    pub handle: TypeHandle,
    pub kind: TypeKind,
    pub name: String,
    pub namespace: Option<String>,
    pub declaring_type: Option<TypeHandle>,
    pub generic_params: Vec<GenericParamDecl>,
    /// Identifier without kind tag.
    pub id: String,
    parents: Vec<TypeHandle>,
    members: Vec<MemberHandle>,
    member_index: HashMap<String, MemberHandle>,
    docs: Option<Arc<Fragment>>,
}

impl DeclaredType {
    /// In-graph parents: base type first, then interfaces.
    pub fn parent_handles(&self) -> &[TypeHandle] {
        &self.parents
    }

    /// Declared members in provider order.
    pub fn member_handles(&self) -> &[MemberHandle] {
        &self.members
    }

    /// Member with the given identifier (relative to this type).
    pub fn member_by_id(&self, id: &str) -> Option<MemberHandle> {
        self.member_index.get(id).copied()
    }

    /// Raw documentation, if any.
    pub fn docs(&self) -> Option<&Fragment> {
        self.docs.as_deref()
    }

    /// Identifier with its `T:` tag.
    pub fn qualified_id(&self) -> String {
        qualified_id(IdKind::Type, &self.id)
    }
}

/// A member in the graph.
#[derive(Debug, Clone)]
pub struct Member {
    pub handle: MemberHandle,
    pub declaring_type: TypeHandle,
    /// Identifier-construction name.
    pub name: String,
    /// Name shown to readers.
    pub display_name: String,
    pub shape: MemberShape,
    /// Identifier relative to the declaring type.
    pub id: String,
    /// Identifier including the declaring type, without kind tag.
    pub full_id: String,
    docs: Option<Arc<Fragment>>,
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        self.shape.kind()
    }

    /// Raw documentation, if any.
    pub fn docs(&self) -> Option<&Fragment> {
        self.docs.as_deref()
    }

    /// Identifier with its kind tag.
    pub fn qualified_id(&self) -> String {
        qualified_id(self.kind().id_kind(), &self.full_id)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// The immutable, identifier-indexed model of all declared elements.
#[derive(Debug, Clone, Default)]
pub struct ElementGraph {
    types: Vec<DeclaredType>,
    members: Vec<Member>,
    type_index: HashMap<String, TypeHandle>,
    /// Types by identifier with encloser arities erased; `None` when ambiguous.
    dotted_index: HashMap<String, Option<TypeHandle>>,
}

impl ElementGraph {
    /// Build the graph from a provider's types and a documentation store.
    pub fn build(provider: &dyn MetadataProvider, store: &DocStore) -> Result<Self, GraphError> {
        let decls = provider.declared_types();
        let ids = compute_type_ids(decls)?;

        let mut graph = ElementGraph::default();
        for (index, (decl, id)) in decls.iter().zip(&ids).enumerate() {
            let handle = TypeHandle::new(index as u32);
            if graph.type_index.insert(id.clone(), handle).is_some() {
                return Err(GraphError::DuplicateType { id: id.clone() });
            }
            graph
                .dotted_index
                .entry(erase_encloser_arity(id))
                .and_modify(|slot| *slot = None)
                .or_insert(Some(handle));
            let docs = lookup_docs(store, &qualified_id(IdKind::Type, id), decl.docs.as_deref());
            graph.types.push(DeclaredType {
                handle,
                kind: decl.kind,
                name: decl.name.clone(),
                namespace: decl.namespace.clone(),
                declaring_type: decl.declaring_type.map(|outer| TypeHandle::new(outer as u32)),
                generic_params: decl.generic_params.clone(),
                id: id.clone(),
                parents: Vec::new(),
                members: Vec::new(),
                member_index: HashMap::new(),
                docs,
            });
        }

        for (index, decl) in decls.iter().enumerate() {
            let handle = TypeHandle::new(index as u32);
            let parents = graph.in_graph_parents(decl, handle);
            let type_params = enclosing_generic_params(decls, index);
            let ctx = GenericContext::new(type_params, &[]);

            let mut members = Vec::with_capacity(decl.members.len());
            let mut member_index = HashMap::with_capacity(decl.members.len());
            for member in &decl.members {
                let member_handle = MemberHandle::new(graph.members.len() as u32);
                let id = member_id(member, &ctx);
                if member_index.insert(id.clone(), member_handle).is_some() {
                    return Err(GraphError::DuplicateMember {
                        type_id: ids[index].clone(),
                        member_id: id,
                    });
                }
                let full_id = format!("{}.{}", ids[index], id);
                let key = qualified_id(member.kind().id_kind(), &full_id);
                let display_name = member.display_name.clone().unwrap_or_else(|| match member.shape {
                    MemberShape::Constructor { .. } => decl.name.clone(),
                    _ => member.name.clone(),
                });
                graph.members.push(Member {
                    handle: member_handle,
                    declaring_type: handle,
                    name: member.name.clone(),
                    display_name,
                    shape: member.shape.clone(),
                    id,
                    full_id,
                    docs: lookup_docs(store, &key, member.docs.as_deref()),
                });
                members.push(member_handle);
            }

            let declared = &mut graph.types[index];
            declared.parents = parents;
            declared.members = members;
            declared.member_index = member_index;
        }

        info!(
            types = graph.types.len(),
            members = graph.members.len(),
            documented = graph.documented_count(),
            "built element graph"
        );
        Ok(graph)
    }

    fn in_graph_parents(&self, decl: &TypeDecl, handle: TypeHandle) -> Vec<TypeHandle> {
        let mut parents = Vec::new();
        for parent in decl.base_type.iter().chain(&decl.interfaces) {
            let Some(id) = definition_id(parent) else {
                continue;
            };
            match self.resolve_type_id(&id) {
                Some(parent_handle) if !parents.contains(&parent_handle) => parents.push(parent_handle),
                Some(_) => {}
                None => debug!(type_handle = %handle, parent = %id, "parent outside the graph"),
            }
        }
        parents
    }

    /// Type a reference's definition identifier names.
    ///
    /// A dotted reference to a type nested in a generic type (`Acme.Outer.Inner`
    /// for `` Acme.Outer`1.Inner ``) matches when exactly one type fits.
    fn resolve_type_id(&self, id: &str) -> Option<TypeHandle> {
        if let Some(&handle) = self.type_index.get(id) {
            return Some(handle);
        }
        self.dotted_index.get(id).copied().flatten()
    }

    fn documented_count(&self) -> usize {
        self.types.iter().filter(|ty| ty.docs.is_some()).count()
            + self.members.iter().filter(|member| member.docs.is_some()).count()
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Type with the given (untagged) identifier.
    pub fn lookup_type(&self, id: &str) -> Option<&DeclaredType> {
        self.type_index.get(id).map(|handle| &self.types[handle.index()])
    }

    /// Member of `ty` with the given identifier (relative to `ty`).
    pub fn lookup_member(&self, ty: &DeclaredType, id: &str) -> Option<&Member> {
        ty.member_by_id(id).map(|handle| &self.members[handle.index()])
    }

    /// Member named by a full identifier (`Acme.Shell.Run(System.String)`).
    pub fn lookup_member_path(&self, full_id: &str) -> Option<&Member> {
        let (type_part, member_part) = split_member_cref(full_id)?;
        let ty = self.lookup_type(type_part)?;
        self.lookup_member(ty, member_part)
    }

    /// Element named by a reference, kind-tagged or bare.
    ///
    /// A tagged reference only matches an element of that kind. A bare one
    /// names a type if one has that identifier, otherwise a member.
    pub fn lookup_cref(&self, cref: &str) -> Option<ElementHandle> {
        let (kind, id) = split_qualified(cref.trim());
        match kind {
            Some(IdKind::Type) => self.lookup_type(id).map(|ty| ty.handle.into()),
            Some(kind) => self
                .lookup_member_path(id)
                .filter(|member| member.kind().id_kind() == kind)
                .map(|member| member.handle.into()),
            None => self
                .lookup_type(id)
                .map(|ty| ElementHandle::from(ty.handle))
                .or_else(|| self.lookup_member_path(id).map(|member| member.handle.into())),
        }
    }

    /// In-graph parents of `ty`, base type first.
    pub fn parents_of(&self, ty: &DeclaredType) -> Vec<&DeclaredType> {
        ty.parents.iter().map(|handle| &self.types[handle.index()]).collect()
    }

    pub fn declared_type(&self, handle: TypeHandle) -> &DeclaredType {
        &self.types[handle.index()]
    }

    pub fn member(&self, handle: MemberHandle) -> &Member {
        &self.members[handle.index()]
    }

    /// All types in provider order.
    pub fn types(&self) -> &[DeclaredType] {
        &self.types
    }

    /// All members, grouped by declaring type in provider order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Every element: each type followed by its members.
    pub fn elements(&self) -> Vec<ElementHandle> {
        let mut out = Vec::with_capacity(self.types.len() + self.members.len());
        for ty in &self.types {
            out.push(ty.handle.into());
            out.extend(ty.members.iter().map(|&member| ElementHandle::Member(member)));
        }
        out
    }

    // ------------------------------------------------------------------------
    // Per-element access
    // ------------------------------------------------------------------------

    /// Raw documentation of an element.
    pub fn docs(&self, handle: ElementHandle) -> Option<&Fragment> {
        self.shared_docs(handle).map(Arc::as_ref)
    }

    pub(crate) fn shared_docs(&self, handle: ElementHandle) -> Option<&Arc<Fragment>> {
        match handle {
            ElementHandle::Type(ty) => self.types[ty.index()].docs.as_ref(),
            ElementHandle::Member(member) => self.members[member.index()].docs.as_ref(),
        }
    }

    /// Kind-tagged identifier of an element.
    pub fn qualified_id(&self, handle: ElementHandle) -> String {
        match handle {
            ElementHandle::Type(ty) => self.declared_type(ty).qualified_id(),
            ElementHandle::Member(member) => self.member(member).qualified_id(),
        }
    }

    /// Reader-facing name of an element.
    pub fn display_name(&self, handle: ElementHandle) -> &str {
        match handle {
            ElementHandle::Type(ty) => &self.declared_type(ty).name,
            ElementHandle::Member(member) => &self.member(member).display_name,
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

/// Identifiers of all types, enclosers first.
fn compute_type_ids(decls: &[TypeDecl]) -> Result<Vec<String>, GraphError> {
    let mut ids: Vec<Option<String>> = vec![None; decls.len()];
    for start in 0..decls.len() {
        let mut chain = Vec::new();
        let mut cursor = start;
        while ids[cursor].is_none() {
            if chain.contains(&cursor) {
                return Err(GraphError::DeclaringTypeCycle {
                    name: decls[cursor].name.clone(),
                });
            }
            chain.push(cursor);
            match decls[cursor].declaring_type {
                Some(outer) if outer >= decls.len() => {
                    return Err(GraphError::UnknownDeclaringType {
                        name: decls[cursor].name.clone(),
                        index: outer,
                    });
                }
                Some(outer) => cursor = outer,
                None => break,
            }
        }
        while let Some(current) = chain.pop() {
            let encloser = decls[current].declaring_type.and_then(|outer| ids[outer].as_deref());
            let id = type_id(&decls[current], encloser);
            ids[current] = Some(id);
        }
    }
    Ok(ids.into_iter().map(Option::unwrap_or_default).collect())
}

/// Type-level generic parameters visible inside a type, innermost first.
///
/// Only called after [`compute_type_ids`] has ruled out bad declaring links.
fn enclosing_generic_params(decls: &[TypeDecl], index: usize) -> Vec<&GenericParamDecl> {
    let mut params = Vec::new();
    let mut cursor = Some(index);
    while let Some(current) = cursor {
        params.extend(decls[current].generic_params.iter());
        cursor = decls[current].declaring_type;
    }
    params
}

fn lookup_docs(store: &DocStore, key: &str, provided: Option<&str>) -> Option<Arc<Fragment>> {
    if let Some(fragment) = store.get(key) {
        return Some(Arc::new(fragment.clone()));
    }
    let text = provided?;
    match Fragment::parse(text) {
        Ok(fragment) => Some(Arc::new(fragment)),
        Err(err) => {
            warn!(id = key, error = %err, "dropping malformed provider documentation");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
