//! JSON output types for CLI responses.
//!
//! Every response is a single JSON object with `status` first and a
//! `schema_version`, so callers can parse stdout without sniffing.
//!
//! - `status`: `"ok"` or `"error"`
//! - Arrays keep graph order; the same input always gives the same output.
//! - Absent optional fields are omitted rather than `null`.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use docgraph_core::error::{DocGraphError, OutputErrorCode};
use docgraph_core::resolve::ResolvedDocs;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Success Responses
// ============================================================================

/// One resolved element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocEntry {
    /// Kind-tagged identifier.
    pub id: String,
    /// Reader-facing name.
    pub name: String,
    /// Resolved documentation as XML; empty when there is none.
    pub xml: String,
}

/// Response for `docgraph resolve --format json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolveResponse {
    pub status: String,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    pub elements: Vec<DocEntry>,
}

impl ResolveResponse {
    pub fn new(assembly: Option<String>, docs: &ResolvedDocs) -> Self {
        ResolveResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            assembly,
            elements: docs
                .iter()
                .map(|doc| DocEntry {
                    id: doc.id.clone(),
                    name: doc.name.clone(),
                    xml: doc.fragment.to_xml(),
                })
                .collect(),
        }
    }
}

/// One identifier listed by `docgraph ids`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdEntry {
    pub id: String,
    pub name: String,
    /// Whether the element has documentation of its own.
    pub documented: bool,
}

/// Response for `docgraph ids`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdsResponse {
    pub status: String,
    pub schema_version: String,
    pub ids: Vec<IdEntry>,
}

impl IdsResponse {
    pub fn new(ids: Vec<IdEntry>) -> Self {
        IdsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            ids,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Numeric error code ([`OutputErrorCode`]).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a DocGraphError.
    pub fn from_error(err: &DocGraphError) -> Self {
        let details = match err {
            DocGraphError::Io { path, .. } => Some(serde_json::json!({ "path": path.display().to_string() })),
            DocGraphError::Store(docgraph_core::error::StoreError::Io { path, .. }) => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a DocGraphError.
    pub fn from_error(err: &DocGraphError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
