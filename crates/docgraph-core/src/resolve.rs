//! Inheritance resolution: replacing `<inheritdoc>` placeholders.
//!
//! Resolution is a depth-first walk over the element graph. For each
//! placeholder in an element's fragment the resolver picks an ordered list of
//! candidate elements, resolves each candidate first, and splices in the
//! content of the first one that has any. A placeholder no candidate can
//! satisfy is removed.
//!
//! # Candidates
//!
//! - **Implicit mode** (no `cref`): the in-graph parents of the element's
//!   type, base first. For a member, each parent contributes its member with
//!   the same identifier, if it has one. With
//!   [`ResolveOptions::search_ancestors`] the walk continues breadth-first
//!   through the remaining ancestors.
//! - **Explicit mode** (`cref` present): the single element the reference
//!   names, or none.
//!
//! # Cycles
//!
//! Elements on the current DFS path are never candidates; a placeholder
//! whose only candidates are on the path is removed. Keeping the path rather
//! than every element ever entered lets two parents share a grandparent.
//!
//! Within one call to [`InheritanceResolver::resolve`], every element is
//! expanded at most once: a finished result is kept in a per-call table and
//! reused, even when it was cut short by a cycle. The work of one call is
//! therefore bounded by the size of the graph.
//!
//! # Memoization
//!
//! A resolution that never skipped a candidate for being on the path does not
//! depend on where the walk started, and is also cached across calls. Results
//! that did skip one only live in the per-call table. The cache sits behind an
//! `RwLock`, which makes the resolver safe to share across threads; a race
//! only ever stores identical content twice.
//!
//! Resolution never fails. Missing targets, cycles, and selectors that match
//! nothing all degrade to "no inherited content".

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::graph::{DeclaredType, ElementGraph, ElementHandle, TypeHandle};
use crate::fragment::{DocNode, Fragment, Placeholder};
use crate::selector::select;
use crate::store::write_doc_file;

// ============================================================================
// Options
// ============================================================================

/// Resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Treat an element with no documentation as holding a bare `<inheritdoc/>`.
    pub inherit_missing: bool,
    /// Continue through transitive ancestors when no direct parent has content.
    pub search_ancestors: bool,
    /// Resolve elements on the rayon thread pool in [`InheritanceResolver::resolve_all`].
    pub parallel: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            inherit_missing: true,
            search_ancestors: false,
            parallel: true,
        }
    }
}

impl ResolveOptions {
    pub fn with_inherit_missing(mut self, enabled: bool) -> Self {
        self.inherit_missing = enabled;
        self
    }

    pub fn with_search_ancestors(mut self, enabled: bool) -> Self {
        self.search_ancestors = enabled;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}

// ============================================================================
// Resolved output
// ============================================================================

/// The resolved documentation of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDoc {
    /// Kind-tagged identifier.
    pub id: String,
    /// Reader-facing name.
    pub name: String,
    pub fragment: Fragment,
}

/// Resolved documentation for every element, in graph order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedDocs {
    entries: Vec<ResolvedDoc>,
}

impl ResolvedDocs {
    /// Fragment resolved for the kind-tagged identifier `id`.
    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.fragment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDoc> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write as a documentation file, skipping elements with no content.
    pub fn to_doc_xml(&self, assembly: Option<&str>) -> String {
        write_doc_file(
            assembly,
            self.entries
                .iter()
                .filter(|entry| !entry.fragment.is_empty())
                .map(|entry| (entry.id.as_str(), &entry.fragment)),
        )
    }
}

impl IntoIterator for ResolvedDocs {
    type Item = ResolvedDoc;
    type IntoIter = std::vec::IntoIter<ResolvedDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Outcome of resolving one element.
#[derive(Debug, Clone)]
struct Resolution {
    fragment: Arc<Fragment>,
    /// False when a candidate was skipped because it was on the DFS path.
    complete: bool,
}

/// State of one top-level resolution.
#[derive(Debug, Default)]
struct Walk {
    path: HashSet<ElementHandle>,
    finished: HashMap<ElementHandle, Resolution>,
    /// Elements whose placeholders were expanded.
    expanded: usize,
}

/// Resolves placeholders over an [`ElementGraph`].
#[derive(Debug)]
pub struct InheritanceResolver<'g> {
    graph: &'g ElementGraph,
    options: ResolveOptions,
    memo: RwLock<HashMap<ElementHandle, Arc<Fragment>>>,
}

impl<'g> InheritanceResolver<'g> {
    /// Create a resolver with default options.
    pub fn new(graph: &'g ElementGraph) -> Self {
        Self::with_options(graph, ResolveOptions::default())
    }

    pub fn with_options(graph: &'g ElementGraph, options: ResolveOptions) -> Self {
        InheritanceResolver {
            graph,
            options,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve one element's documentation.
    pub fn resolve(&self, handle: impl Into<ElementHandle>) -> Arc<Fragment> {
        let handle = handle.into();
        let mut walk = Walk::default();
        let resolution = self.dfs_resolve(handle, &mut walk);
        trace!(element = %handle, expanded = walk.expanded, "resolved element");
        resolution.fragment
    }

    /// Resolve every element of the graph.
    pub fn resolve_all(&self) -> ResolvedDocs {
        let elements = self.graph.elements();
        let resolve_one = |handle: &ElementHandle| ResolvedDoc {
            id: self.graph.qualified_id(*handle),
            name: self.graph.display_name(*handle).to_string(),
            fragment: Arc::unwrap_or_clone(self.resolve(*handle)),
        };
        let entries: Vec<ResolvedDoc> = if self.options.parallel {
            elements.par_iter().map(resolve_one).collect()
        } else {
            elements.iter().map(resolve_one).collect()
        };
        info!(
            elements = entries.len(),
            documented = entries.iter().filter(|entry| !entry.fragment.is_empty()).count(),
            parallel = self.options.parallel,
            "resolved documentation"
        );
        ResolvedDocs { entries }
    }

    fn dfs_resolve(&self, handle: ElementHandle, walk: &mut Walk) -> Resolution {
        if let Some(fragment) = self.cached(handle) {
            return Resolution {
                fragment,
                complete: true,
            };
        }
        if let Some(resolution) = walk.finished.get(&handle) {
            return resolution.clone();
        }

        let raw = match self.graph.shared_docs(handle) {
            Some(fragment) => Arc::clone(fragment),
            None if self.options.inherit_missing => Arc::new(Fragment::implicit_placeholder()),
            None => Arc::new(Fragment::empty()),
        };
        if !raw.has_placeholders() {
            self.remember(handle, &raw);
            return Resolution {
                fragment: raw,
                complete: true,
            };
        }

        walk.path.insert(handle);
        walk.expanded += 1;
        let mut complete = true;
        let resolved = raw.map_placeholders(|placeholder| {
            let (nodes, placeholder_complete) = self.resolve_placeholder(handle, placeholder, walk);
            complete &= placeholder_complete;
            nodes
        });
        walk.path.remove(&handle);

        let resolution = Resolution {
            fragment: Arc::new(resolved),
            complete,
        };
        if complete {
            self.remember(handle, &resolution.fragment);
        }
        walk.finished.insert(handle, resolution.clone());
        resolution
    }

    /// Content for one placeholder, and whether it was found without a cycle cut.
    fn resolve_placeholder(
        &self,
        handle: ElementHandle,
        placeholder: &Placeholder,
        walk: &mut Walk,
    ) -> (Vec<DocNode>, bool) {
        let candidates = self.candidates(handle, placeholder);
        trace!(element = %handle, candidates = candidates.len(), "placeholder candidates");

        let mut complete = true;
        for candidate in candidates {
            if walk.path.contains(&candidate) {
                trace!(element = %handle, candidate = %candidate, "skipping candidate on current path");
                complete = false;
                continue;
            }
            let resolution = self.dfs_resolve(candidate, walk);
            complete &= resolution.complete;
            let nodes = match placeholder.path.as_deref() {
                Some(expr) => select(&resolution.fragment, expr),
                None => resolution.fragment.nodes().to_vec(),
            };
            if nodes.iter().any(|node| !node.is_blank()) {
                debug!(
                    element = %self.graph.qualified_id(handle),
                    source = %self.graph.qualified_id(candidate),
                    "inherited documentation"
                );
                return (nodes, complete);
            }
        }

        debug!(element = %self.graph.qualified_id(handle), "no inherited content, removing placeholder");
        (Vec::new(), complete)
    }

    fn candidates(&self, handle: ElementHandle, placeholder: &Placeholder) -> Vec<ElementHandle> {
        if let Some(cref) = placeholder.cref.as_deref() {
            return match self.graph.lookup_cref(cref) {
                Some(target) => vec![target],
                None => {
                    debug!(element = %handle, cref, "reference names no element in the graph");
                    Vec::new()
                }
            };
        }

        let (owner, member_id) = match handle {
            ElementHandle::Type(ty) => (ty, None),
            ElementHandle::Member(member) => {
                let member = self.graph.member(member);
                (member.declaring_type, Some(member.id.as_str()))
            }
        };
        let counterpart = |ty: &DeclaredType| -> Option<ElementHandle> {
            match member_id {
                Some(id) => ty.member_by_id(id).map(ElementHandle::Member),
                None => Some(ElementHandle::Type(ty.handle)),
            }
        };

        let ancestors = if self.options.search_ancestors {
            self.ancestors(owner)
        } else {
            self.graph.declared_type(owner).parent_handles().to_vec()
        };
        ancestors
            .into_iter()
            .filter_map(|ty| counterpart(self.graph.declared_type(ty)))
            .collect()
    }

    /// All transitive ancestors of `ty`, breadth-first, direct parents first.
    fn ancestors(&self, ty: TypeHandle) -> Vec<TypeHandle> {
        let mut seen = HashSet::from([ty]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            for &parent in self.graph.declared_type(current).parent_handles() {
                if seen.insert(parent) {
                    order.push(parent);
                    queue.push_back(parent);
                }
            }
        }
        order
    }

    fn cached(&self, handle: ElementHandle) -> Option<Arc<Fragment>> {
        self.memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
    }

    fn remember(&self, handle: ElementHandle, fragment: &Arc<Fragment>) {
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::clone(fragment));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberDecl, ParamDecl, TypeDecl, TypeRef};
    use crate::store::DocStore;

    fn graph(types: Vec<TypeDecl>) -> ElementGraph {
        ElementGraph::build(&types, &DocStore::new()).unwrap()
    }

    fn resolved_xml(graph: &ElementGraph, options: ResolveOptions, cref: &str) -> String {
        let resolver = InheritanceResolver::with_options(graph, options);
        let handle = graph.lookup_cref(cref).unwrap();
        resolver.resolve(handle).to_xml()
    }

    fn run(name: &str) -> MemberDecl {
        MemberDecl::method(name, vec![ParamDecl::new("x", TypeRef::int32())])
    }

    mod options {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = ResolveOptions::default();
            assert!(options.inherit_missing);
            assert!(!options.search_ancestors);
            assert!(options.parallel);
        }

        #[test]
        fn test_deserialize_partial() {
            let options: ResolveOptions = serde_json::from_str(r#"{ "search_ancestors": true }"#).unwrap();
            assert_eq!(options, ResolveOptions::default().with_search_ancestors(true));
        }
    }

    mod implicit {
        use super::*;

        #[test]
        fn test_text_around_placeholder_kept() {
            let g = graph(vec![
                TypeDecl::class("Acme", "A").with_docs("<summary>Base.</summary>"),
                TypeDecl::class("Acme", "B")
                    .with_base(TypeRef::named("Acme", "A"))
                    .with_docs("<remarks>Own.</remarks><inheritdoc/>"),
            ]);
            assert_eq!(
                resolved_xml(&g, ResolveOptions::default(), "T:Acme.B"),
                "<remarks>Own.</remarks><summary>Base.</summary>"
            );
        }

        #[test]
        fn test_first_parent_with_content_wins() {
            let g = graph(vec![
                TypeDecl::class("Acme", "Base"),
                TypeDecl::interface("Acme", "IFirst").with_docs("<summary>First.</summary>"),
                TypeDecl::interface("Acme", "ISecond").with_docs("<summary>Second.</summary>"),
                TypeDecl::class("Acme", "Impl")
                    .with_base(TypeRef::named("Acme", "Base"))
                    .with_interface(TypeRef::named("Acme", "IFirst"))
                    .with_interface(TypeRef::named("Acme", "ISecond"))
                    .with_docs("<inheritdoc/>"),
            ]);
            let options = ResolveOptions::default().with_inherit_missing(false);
            assert_eq!(resolved_xml(&g, options, "T:Acme.Impl"), "<summary>First.</summary>");
        }

        #[test]
        fn test_missing_docs_inherit_by_default() {
            let g = graph(vec![
                TypeDecl::class("Acme", "A").with_member(run("Run").with_docs("<summary>Runs.</summary>")),
                TypeDecl::class("Acme", "B")
                    .with_base(TypeRef::named("Acme", "A"))
                    .with_member(run("Run")),
            ]);
            let id = "M:Acme.B.Run(System.Int32)";
            assert_eq!(resolved_xml(&g, ResolveOptions::default(), id), "<summary>Runs.</summary>");
            let strict = ResolveOptions::default().with_inherit_missing(false);
            assert_eq!(resolved_xml(&g, strict, id), "");
        }

        #[test]
        fn test_chain_resolves_transitively() {
            let g = graph(vec![
                TypeDecl::class("Acme", "A").with_member(run("Run").with_docs("<summary>Deep.</summary>")),
                TypeDecl::class("Acme", "B")
                    .with_base(TypeRef::named("Acme", "A"))
                    .with_member(run("Run").with_docs("<inheritdoc/>")),
                TypeDecl::class("Acme", "C")
                    .with_base(TypeRef::named("Acme", "B"))
                    .with_member(run("Run").with_docs("<inheritdoc/>")),
            ]);
            assert_eq!(
                resolved_xml(&g, ResolveOptions::default(), "M:Acme.C.Run(System.Int32)"),
                "<summary>Deep.</summary>"
            );
        }

        #[test]
        fn test_search_ancestors_skips_gaps() {
            // B declares no Run, so only the ancestor walk reaches A.Run
            let g = graph(vec![
                TypeDecl::class("Acme", "A").with_member(run("Run").with_docs("<summary>Far.</summary>")),
                TypeDecl::class("Acme", "B").with_base(TypeRef::named("Acme", "A")),
                TypeDecl::class("Acme", "C")
                    .with_base(TypeRef::named("Acme", "B"))
                    .with_member(run("Run").with_docs("<inheritdoc/>")),
            ]);
            let id = "M:Acme.C.Run(System.Int32)";
            assert_eq!(resolved_xml(&g, ResolveOptions::default(), id), "");
            let deep = ResolveOptions::default().with_search_ancestors(true);
            assert_eq!(resolved_xml(&g, deep, id), "<summary>Far.</summary>");
        }
    }

    mod explicit {
        use super::*;

        #[test]
        fn test_self_reference_removed() {
            let g = graph(vec![TypeDecl::class("Acme", "A")
                .with_docs("<summary>S</summary><inheritdoc cref=\"T:Acme.A\"/>")]);
            assert_eq!(resolved_xml(&g, ResolveOptions::default(), "T:Acme.A"), "<summary>S</summary>");
        }

        #[test]
        fn test_unknown_reference_removed() {
            let g = graph(vec![TypeDecl::class("Acme", "A").with_docs("<inheritdoc cref=\"T:Acme.Gone\"/>")]);
            assert_eq!(resolved_xml(&g, ResolveOptions::default(), "T:Acme.A"), "");
        }

        #[test]
        fn test_reference_to_member_of_unrelated_type() {
            let g = graph(vec![
                TypeDecl::class("Acme", "Helper")
                    .with_member(run("Run").with_docs("<summary>Helper run.</summary><returns>n</returns>")),
                TypeDecl::class("Acme", "Tool").with_member(
                    run("Go").with_docs("<inheritdoc cref=\"M:Acme.Helper.Run(System.Int32)\" path=\"returns\"/>"),
                ),
            ]);
            assert_eq!(
                resolved_xml(&g, ResolveOptions::default(), "M:Acme.Tool.Go(System.Int32)"),
                "<returns>n</returns>"
            );
        }
    }

    mod cycles {
        use super::*;

        #[test]
        fn test_diamond_shares_base_content() {
            let g = graph(vec![
                TypeDecl::interface("Acme", "IRoot").with_docs("<summary>Root.</summary>"),
                TypeDecl::interface("Acme", "ILeft")
                    .with_interface(TypeRef::named("Acme", "IRoot"))
                    .with_docs("<inheritdoc/>"),
                TypeDecl::interface("Acme", "IRight")
                    .with_interface(TypeRef::named("Acme", "IRoot"))
                    .with_docs("<remarks><inheritdoc path=\"summary/node()\"/></remarks>"),
                TypeDecl::class("Acme", "Both")
                    .with_interface(TypeRef::named("Acme", "ILeft"))
                    .with_interface(TypeRef::named("Acme", "IRight"))
                    .with_docs("<inheritdoc/><inheritdoc cref=\"T:Acme.IRight\"/>"),
            ]);
            assert_eq!(
                resolved_xml(&g, ResolveOptions::default(), "T:Acme.Both"),
                "<summary>Root.</summary><remarks>Root.</remarks>"
            );
        }

        #[test]
        fn test_cut_results_not_cached() {
            // IA <-> IB; IB's own result depends on where the walk started
            let g = graph(vec![
                TypeDecl::interface("Acme", "IA")
                    .with_interface(TypeRef::named("Acme", "IB"))
                    .with_docs("<summary>A.</summary><inheritdoc/>"),
                TypeDecl::interface("Acme", "IB")
                    .with_interface(TypeRef::named("Acme", "IA"))
                    .with_docs("<inheritdoc/>"),
            ]);
            let resolver = InheritanceResolver::new(&g);
            let a = g.lookup_cref("T:Acme.IA").unwrap();
            let b = g.lookup_cref("T:Acme.IB").unwrap();
            assert_eq!(resolver.resolve(a).to_xml(), "<summary>A.</summary>");
            assert_eq!(resolver.resolve(b).to_xml(), "<summary>A.</summary>");
        }

        fn mutual_cluster(size: usize) -> ElementGraph {
            let names: Vec<String> = (0..size).map(|i| format!("I{}", i)).collect();
            let mut types = vec![TypeDecl::interface("Acme", "IRoot").with_docs("<summary>Root.</summary>")];
            for name in &names {
                let mut decl = TypeDecl::interface("Acme", name).with_docs("<inheritdoc/>");
                for other in names.iter().filter(|other| *other != name) {
                    decl = decl.with_interface(TypeRef::named("Acme", other));
                }
                types.push(decl.with_interface(TypeRef::named("Acme", "IRoot")));
            }
            graph(types)
        }

        #[test]
        fn test_mutual_cluster_expands_each_element_once() {
            let g = mutual_cluster(12);
            let resolver = InheritanceResolver::new(&g);
            let start = g.lookup_cref("T:Acme.I0").unwrap();
            let mut walk = Walk::default();
            let resolution = resolver.dfs_resolve(start, &mut walk);
            assert_eq!(resolution.fragment.to_xml(), "<summary>Root.</summary>");
            assert!(walk.expanded <= 12, "expanded {} elements", walk.expanded);
        }

        #[test]
        fn test_mutual_cluster_resolves_everywhere() {
            let g = mutual_cluster(10);
            let docs = InheritanceResolver::new(&g).resolve_all();
            for entry in docs.iter() {
                assert_eq!(entry.fragment.to_xml(), "<summary>Root.</summary>", "{}", entry.id);
            }
        }
    }

    mod resolve_all {
        use super::*;

        fn sample() -> ElementGraph {
            graph(vec![
                TypeDecl::class("Acme", "A")
                    .with_docs("<summary>A.</summary>")
                    .with_member(run("Run").with_docs("<summary>Runs.</summary>")),
                TypeDecl::class("Acme", "B")
                    .with_base(TypeRef::named("Acme", "A"))
                    .with_member(run("Run")),
            ])
        }

        #[test]
        fn test_entries_in_graph_order() {
            let g = sample();
            let docs = InheritanceResolver::new(&g).resolve_all();
            let ids: Vec<&str> = docs.iter().map(|entry| entry.id.as_str()).collect();
            assert_eq!(
                ids,
                vec!["T:Acme.A", "M:Acme.A.Run(System.Int32)", "T:Acme.B", "M:Acme.B.Run(System.Int32)"]
            );
            assert_eq!(docs.get("T:Acme.B").unwrap().to_xml(), "<summary>A.</summary>");
        }

        #[test]
        fn test_parallel_matches_sequential() {
            let g = sample();
            let parallel = InheritanceResolver::new(&g).resolve_all();
            let sequential =
                InheritanceResolver::with_options(&g, ResolveOptions::default().with_parallel(false)).resolve_all();
            assert_eq!(parallel, sequential);
        }

        #[test]
        fn test_doc_xml_skips_empty() {
            let g = graph(vec![TypeDecl::class("Acme", "Bare"), TypeDecl::class("Acme", "Doc").with_docs("<summary>D</summary>")]);
            let xml = InheritanceResolver::new(&g).resolve_all().to_doc_xml(Some("Acme"));
            assert!(xml.contains("<member name=\"T:Acme.Doc\"><summary>D</summary></member>"));
            assert!(!xml.contains("T:Acme.Bare"));
        }
    }
}
