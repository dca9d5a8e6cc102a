//! End-to-end resolution tests: model + documentation file in, resolved
//! documentation out.
//!
//! # Organization
//!
//! - identifiers: literal encodings and signature decoding
//! - placeholders: removal, simple inheritance, selectors, explicit references
//! - cycles: interface cycles terminate
//! - whole graph: `resolve_all` and the written documentation file

use docgraph_core::docid::{member_id, qualified_id, GenericContext, IdKind, MemberSignature};
use docgraph_core::fragment::Fragment;
use docgraph_core::graph::{ElementGraph, ElementHandle};
use docgraph_core::model::{MemberDecl, ParamDecl, TypeDecl, TypeRef};
use docgraph_core::provider::ModelBundle;
use docgraph_core::resolve::{InheritanceResolver, ResolveOptions};
use docgraph_core::resolve_documentation;
use docgraph_core::store::DocStore;

fn execute(by_ref: bool) -> MemberDecl {
    let param = if by_ref {
        ParamDecl::by_ref("command", TypeRef::string())
    } else {
        ParamDecl::new("command", TypeRef::string())
    };
    MemberDecl::method("Execute", vec![param])
}

fn resolve_xml(bundle: &ModelBundle, store: &DocStore, cref: &str) -> String {
    let graph = ElementGraph::build(bundle, store).unwrap();
    let handle = graph.lookup_cref(cref).unwrap();
    InheritanceResolver::new(&graph).resolve(handle).to_xml()
}

// ============================================================================
// Identifiers
// ============================================================================

mod identifiers {
    use super::*;

    #[test]
    fn by_value_and_by_ref_parameters() {
        let ctx = GenericContext::default();
        assert_eq!(member_id(&execute(false), &ctx), "Execute(System.String)");
        assert_eq!(member_id(&execute(true), &ctx), "Execute(System.String@)");
    }

    #[test]
    fn nested_generic_arguments() {
        let mut bundle = ModelBundle::new();
        let dictionary = TypeRef::generic(
            "Namespace",
            "Dictionary",
            vec![
                TypeRef::string(),
                TypeRef::generic("Namespace", "List", vec![TypeRef::named("Other", "Person")]),
            ],
        );
        bundle.push_type(
            TypeDecl::class("Namespace", "Registry")
                .with_member(MemberDecl::method("Load", vec![ParamDecl::new("map", dictionary)])),
        );
        let graph = ElementGraph::build(&bundle, &DocStore::new()).unwrap();
        let registry = graph.lookup_type("Namespace.Registry").unwrap();
        let load = graph.member(registry.member_handles()[0]);
        assert_eq!(
            load.id,
            "Load(Namespace.Dictionary{System.String,Namespace.List{Other.Person}})"
        );
    }

    #[test]
    fn encoded_signatures_decode_to_parameter_types() {
        let members = vec![
            execute(false),
            execute(true),
            MemberDecl::method(
                "Copy",
                vec![
                    ParamDecl::new("source", TypeRef::array(TypeRef::int32())),
                    ParamDecl::by_ref("count", TypeRef::int32()),
                ],
            ),
        ];
        let ctx = GenericContext::default();
        for member in &members {
            let signature = MemberSignature::parse(&member_id(member, &ctx));
            assert_eq!(signature.name, member.name);
            let params = member.shape.params();
            assert_eq!(signature.params.len(), params.len());
            for (decoded, declared) in signature.params.iter().zip(params) {
                assert_eq!(decoded.by_ref, declared.by_ref);
                assert_eq!(
                    decoded.type_id,
                    docgraph_core::docid::type_ref_id(&declared.ty, &ctx)
                );
            }
        }
    }

    #[test]
    fn kind_tags() {
        assert_eq!(qualified_id(IdKind::Method, "Acme.Run"), "M:Acme.Run");
        assert_eq!(qualified_id(IdKind::Type, "Acme"), "T:Acme");
    }
}

// ============================================================================
// Placeholders
// ============================================================================

mod placeholders {
    use super::*;

    #[test]
    fn no_parent_placeholder_is_removed() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(TypeDecl::class("Acme", "Root"));
        let mut store = DocStore::new();
        store.insert(
            "T:Acme.Root",
            Fragment::parse("<summary>Root <c>type</c>.</summary><inheritdoc/>").unwrap(),
        );
        assert_eq!(
            resolve_xml(&bundle, &store, "T:Acme.Root"),
            "<summary>Root <c>type</c>.</summary>"
        );
    }

    #[test]
    fn member_inherits_from_base_type() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(TypeDecl::class("Acme", "A").with_member(MemberDecl::method("M", vec![])));
        bundle.push_type(
            TypeDecl::class("Acme", "B")
                .with_base(TypeRef::named("Acme", "A"))
                .with_member(MemberDecl::method("M", vec![])),
        );
        let store = DocStore::parse(
            r#"<doc><members>
                 <member name="M:Acme.A.M"><summary>D</summary></member>
                 <member name="M:Acme.B.M"><inheritdoc/></member>
               </members></doc>"#,
        )
        .unwrap();
        assert_eq!(resolve_xml(&bundle, &store, "M:Acme.B.M"), "<summary>D</summary>");
    }

    #[test]
    fn selector_pulls_only_matching_node() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(TypeDecl::interface("Acme", "ICounter").with_member(MemberDecl::method("Count", vec![])));
        bundle.push_type(
            TypeDecl::class("Acme", "Counter")
                .with_interface(TypeRef::named("Acme", "ICounter"))
                .with_member(MemberDecl::method("Count", vec![])),
        );
        let store = DocStore::parse(
            r#"<doc><members>
                 <member name="M:Acme.ICounter.Count"><summary>Counts.</summary><returns>The count.</returns></member>
                 <member name="M:Acme.Counter.Count"><summary>Counts fast.</summary><inheritdoc path="returns"/></member>
               </members></doc>"#,
        )
        .unwrap();
        assert_eq!(
            resolve_xml(&bundle, &store, "M:Acme.Counter.Count"),
            "<summary>Counts fast.</summary><returns>The count.</returns>"
        );
    }

    #[test]
    fn explicit_reference_ignores_hierarchy() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(TypeDecl::class("Acme", "Parent").with_member(execute(false)));
        bundle.push_type(TypeDecl::class("Acme", "Other").with_member(execute(false)));
        bundle.push_type(
            TypeDecl::class("Acme", "Child")
                .with_base(TypeRef::named("Acme", "Parent"))
                .with_member(execute(false)),
        );
        let store = DocStore::parse(
            r#"<doc><members>
                 <member name="M:Acme.Parent.Execute(System.String)"><summary>Parent.</summary></member>
                 <member name="M:Acme.Other.Execute(System.String)"><summary>Other.</summary></member>
                 <member name="M:Acme.Child.Execute(System.String)"><inheritdoc cref="M:Acme.Other.Execute(System.String)"/></member>
               </members></doc>"#,
        )
        .unwrap();
        assert_eq!(
            resolve_xml(&bundle, &store, "M:Acme.Child.Execute(System.String)"),
            "<summary>Other.</summary>"
        );
    }

    #[test]
    fn base_nested_in_generic_type_is_a_parent() {
        let bundle = ModelBundle::from_json(
            r#"{
                "types": [
                    { "name": "Outer", "namespace": "Acme",
                      "generic_params": [ { "scope": "type", "index": 0, "name": "T" } ] },
                    { "name": "Inner", "declaring_type": 0,
                      "docs": "<summary>Inner node.</summary>" },
                    { "name": "Leaf", "namespace": "Acme",
                      "base_type": { "kind": "named", "name": "Inner",
                        "declaring": { "kind": "named", "namespace": "Acme", "name": "Outer",
                          "args": [ { "kind": "named", "namespace": "System", "name": "Int32" } ] } } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            resolve_xml(&bundle, &DocStore::new(), "T:Acme.Leaf"),
            "<summary>Inner node.</summary>"
        );
    }
}

// ============================================================================
// Cycles
// ============================================================================

mod cycles {
    use super::*;

    #[test]
    fn interface_cycle_terminates_with_placeholders_removed() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(TypeDecl::interface("Acme", "IX").with_interface(TypeRef::named("Acme", "IY")));
        bundle.push_type(TypeDecl::interface("Acme", "IY").with_interface(TypeRef::named("Acme", "IX")));
        bundle.push_type(TypeDecl::class("Acme", "X").with_interface(TypeRef::named("Acme", "IY")));
        bundle.push_type(TypeDecl::class("Acme", "Y").with_interface(TypeRef::named("Acme", "IX")));
        let mut store = DocStore::new();
        for id in ["T:Acme.IX", "T:Acme.IY", "T:Acme.X", "T:Acme.Y"] {
            store.insert(id, Fragment::implicit_placeholder());
        }

        let graph = ElementGraph::build(&bundle, &store).unwrap();
        let resolver = InheritanceResolver::new(&graph);
        for id in ["T:Acme.X", "T:Acme.Y", "T:Acme.IX", "T:Acme.IY"] {
            let handle = graph.lookup_cref(id).unwrap();
            let resolved = resolver.resolve(handle);
            assert!(!resolved.has_placeholders(), "{id} kept a placeholder");
            assert!(resolved.is_empty(), "{id} gained content");
        }
    }

    #[test]
    fn member_cycle_through_explicit_references() {
        let mut bundle = ModelBundle::new();
        bundle.push_type(
            TypeDecl::class("Acme", "Ping")
                .with_member(MemberDecl::method("Go", vec![]).with_docs("<inheritdoc cref=\"M:Acme.Pong.Go\"/>")),
        );
        bundle.push_type(
            TypeDecl::class("Acme", "Pong")
                .with_member(MemberDecl::method("Go", vec![]).with_docs("<inheritdoc cref=\"M:Acme.Ping.Go\"/>")),
        );
        let docs = resolve_documentation(&bundle, &DocStore::new(), ResolveOptions::default()).unwrap();
        assert!(docs.get("M:Acme.Ping.Go").unwrap().is_empty());
        assert!(docs.get("M:Acme.Pong.Go").unwrap().is_empty());
    }
}

// ============================================================================
// Whole graph
// ============================================================================

mod whole_graph {
    use super::*;

    fn bundle() -> ModelBundle {
        ModelBundle::from_json(
            r#"{
                "assembly": "Acme",
                "types": [
                    { "kind": "interface", "name": "IShell", "namespace": "Acme",
                      "docs": "<summary>A command shell.</summary>",
                      "members": [
                        { "name": "Execute", "kind": "method",
                          "params": [ { "name": "command", "type": { "kind": "named", "namespace": "System", "name": "String" } } ],
                          "docs": "<summary>Runs a command.</summary><returns>Exit code.</returns>" }
                      ] },
                    { "name": "Shell", "namespace": "Acme",
                      "interfaces": [ { "kind": "named", "namespace": "Acme", "name": "IShell" } ],
                      "members": [
                        { "name": "Execute", "kind": "method",
                          "params": [ { "name": "command", "type": { "kind": "named", "namespace": "System", "name": "String" } } ] },
                        { "name": ".ctor", "kind": "constructor" }
                      ] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn every_element_resolved_in_order() {
        let docs = resolve_documentation(&bundle(), &DocStore::new(), ResolveOptions::default()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "T:Acme.IShell",
                "M:Acme.IShell.Execute(System.String)",
                "T:Acme.Shell",
                "M:Acme.Shell.Execute(System.String)",
                "M:Acme.Shell.#ctor",
            ]
        );
        assert_eq!(
            docs.get("M:Acme.Shell.Execute(System.String)").unwrap().to_xml(),
            "<summary>Runs a command.</summary><returns>Exit code.</returns>"
        );
        assert_eq!(docs.get("T:Acme.Shell").unwrap().to_xml(), "<summary>A command shell.</summary>");
        assert!(docs.get("M:Acme.Shell.#ctor").unwrap().is_empty());
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let model = bundle();
        let store = DocStore::new();
        let parallel = resolve_documentation(&model, &store, ResolveOptions::default()).unwrap();
        let sequential =
            resolve_documentation(&model, &store, ResolveOptions::default().with_parallel(false)).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn written_file_loads_as_store() {
        let docs = resolve_documentation(&bundle(), &DocStore::new(), ResolveOptions::default()).unwrap();
        let store = DocStore::parse(&docs.to_doc_xml(Some("Acme"))).unwrap();
        assert_eq!(store.assembly_name(), Some("Acme"));
        assert_eq!(store.len(), 4);
        assert_eq!(
            store.get("T:Acme.Shell").map(Fragment::to_xml).as_deref(),
            Some("<summary>A command shell.</summary>")
        );
    }

    #[test]
    fn handles_round_trip_through_cref() {
        let graph = ElementGraph::build(&bundle(), &DocStore::new()).unwrap();
        for handle in graph.elements() {
            let id = graph.qualified_id(handle);
            assert_eq!(graph.lookup_cref(&id), Some(handle), "{id}");
        }
        assert!(matches!(graph.lookup_cref("M:Acme.Shell.#ctor"), Some(ElementHandle::Member(_))));
    }
}
