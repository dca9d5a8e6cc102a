//! CLI front door.
//!
//! Helpers behind the `docgraph` subcommands:
//! - `resolve` - resolve every element and print the result as JSON or as a
//!   documentation file
//! - `ids` - list every element's kind-tagged identifier
//!
//! All functions return `Result<String, DocGraphError>`; the caller prints the
//! string and turns an error into the JSON error envelope and exit status.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use docgraph_core::error::DocGraphError;
use docgraph_core::graph::ElementGraph;
use docgraph_core::provider::{MetadataProvider, ModelBundle};
use docgraph_core::resolve::{InheritanceResolver, ResolveOptions};
use docgraph_core::store::DocStore;

use crate::output::{IdEntry, IdsResponse, ResolveResponse};

/// How `resolve` prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON response envelope.
    #[default]
    Json,
    /// Documentation file (`<doc><members>...`).
    Xml,
}

/// Load a JSON model file.
pub fn load_model(path: &Path) -> Result<ModelBundle, DocGraphError> {
    let text = fs::read_to_string(path).map_err(|e| DocGraphError::io(path, e))?;
    let bundle = ModelBundle::from_json(&text)?;
    info!(path = %path.display(), types = bundle.types.len(), "loaded model");
    Ok(bundle)
}

/// Load and merge documentation files; later files win.
pub fn load_docs(paths: &[PathBuf]) -> Result<DocStore, DocGraphError> {
    let mut store = DocStore::new();
    for path in paths {
        store.merge(DocStore::load(path)?);
    }
    Ok(store)
}

/// Resolve every element of the model.
pub fn run_resolve(
    model: &Path,
    docs: &[PathBuf],
    format: OutputFormat,
    options: ResolveOptions,
) -> Result<String, DocGraphError> {
    let bundle = load_model(model)?;
    let store = load_docs(docs)?;
    let graph = ElementGraph::build(&bundle, &store)?;
    let resolved = InheritanceResolver::with_options(&graph, options).resolve_all();

    let assembly = bundle
        .assembly_name()
        .or_else(|| store.assembly_name())
        .map(str::to_string);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ResolveResponse::new(assembly, &resolved))
            .map_err(|e| DocGraphError::internal(format!("JSON serialization error: {}", e))),
        OutputFormat::Xml => Ok(resolved.to_doc_xml(assembly.as_deref())),
    }
}

/// List every element's identifier.
pub fn run_ids(model: &Path, docs: &[PathBuf]) -> Result<String, DocGraphError> {
    let bundle = load_model(model)?;
    let store = load_docs(docs)?;
    let graph = ElementGraph::build(&bundle, &store)?;
    let ids = graph
        .elements()
        .into_iter()
        .map(|handle| IdEntry {
            id: graph.qualified_id(handle),
            name: graph.display_name(handle).to_string(),
            documented: graph.docs(handle).is_some(),
        })
        .collect();
    serde_json::to_string_pretty(&IdsResponse::new(ids))
        .map_err(|e| DocGraphError::internal(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_core::error::OutputErrorCode;

    const MODEL: &str = r#"{
        "assembly": "Acme",
        "types": [
            { "name": "Base", "namespace": "Acme",
              "members": [ { "name": "Run", "kind": "method" } ] },
            { "name": "Derived", "namespace": "Acme",
              "base_type": { "kind": "named", "namespace": "Acme", "name": "Base" },
              "members": [ { "name": "Run", "kind": "method" } ] }
        ]
    }"#;

    const DOCS: &str = r#"<doc><members>
        <member name="T:Acme.Base"><summary>Base type.</summary></member>
        <member name="M:Acme.Base.Run"><summary>Runs.</summary></member>
    </members></doc>"#;

    fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let model = dir.join("model.json");
        let docs = dir.join("docs.xml");
        fs::write(&model, MODEL).unwrap();
        fs::write(&docs, DOCS).unwrap();
        (model, docs)
    }

    #[test]
    fn resolve_json_includes_inherited_docs() {
        let dir = tempfile::tempdir().unwrap();
        let (model, docs) = write_inputs(dir.path());
        let out = run_resolve(&model, &[docs], OutputFormat::Json, ResolveOptions::default()).unwrap();
        let response: ResolveResponse = serde_json::from_str(&out).unwrap();
        assert_eq!(response.assembly.as_deref(), Some("Acme"));
        let derived_run = response
            .elements
            .iter()
            .find(|entry| entry.id == "M:Acme.Derived.Run")
            .unwrap();
        assert_eq!(derived_run.xml, "<summary>Runs.</summary>");
    }

    #[test]
    fn resolve_xml_writes_doc_file() {
        let dir = tempfile::tempdir().unwrap();
        let (model, docs) = write_inputs(dir.path());
        let out = run_resolve(&model, &[docs], OutputFormat::Xml, ResolveOptions::default()).unwrap();
        let store = DocStore::parse(&out).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get("T:Acme.Derived").unwrap().to_xml(), "<summary>Base type.</summary>");
    }

    #[test]
    fn later_docs_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let (_model, docs) = write_inputs(dir.path());
        let extra = dir.path().join("extra.xml");
        fs::write(
            &extra,
            r#"<doc><members><member name="M:Acme.Base.Run"><summary>Patched.</summary></member></members></doc>"#,
        )
        .unwrap();
        let store = load_docs(&[docs, extra]).unwrap();
        assert_eq!(store.get("M:Acme.Base.Run").unwrap().to_xml(), "<summary>Patched.</summary>");
    }

    #[test]
    fn ids_lists_every_element() {
        let dir = tempfile::tempdir().unwrap();
        let (model, docs) = write_inputs(dir.path());
        let out = run_ids(&model, &[docs]).unwrap();
        let response: IdsResponse = serde_json::from_str(&out).unwrap();
        let ids: Vec<&str> = response.ids.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["T:Acme.Base", "M:Acme.Base.Run", "T:Acme.Derived", "M:Acme.Derived.Run"]);
        assert!(response.ids[0].documented);
        assert!(!response.ids[2].documented);
    }

    #[test]
    fn missing_model_is_input_error() {
        let err = run_ids(Path::new("/nonexistent/model.json"), &[]).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::InputError);
    }

    #[test]
    fn bad_model_json_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, "{ not json").unwrap();
        let err = run_ids(&model, &[]).unwrap_err();
        assert!(matches!(err, DocGraphError::Json(_)));
        assert_eq!(err.error_code().code(), 3);
    }

    #[test]
    fn duplicate_types_are_graph_errors() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        fs::write(
            &model,
            r#"{ "types": [ { "name": "A", "namespace": "Acme" }, { "name": "A", "namespace": "Acme" } ] }"#,
        )
        .unwrap();
        let err = run_ids(&model, &[]).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::GraphError);
    }
}
