//! Error types and error codes for docgraph.
//!
//! Only two classes of failure are errors at all:
//!
//! - **Input errors**: a documentation store or model file that cannot be read
//!   or parsed ([`StoreError`], JSON errors). A [`FragmentError`] from
//!   provider documentation is logged and the fragment dropped.
//! - **Graph construction errors** ([`GraphError`]): invariant violations in
//!   the provider's data, such as duplicate identifiers. These are fatal
//!   because no resolution over a broken graph is meaningful.
//!
//! Command-line usage errors are reported as
//! [`DocGraphError::InvalidArguments`].
//!
//! Everything the resolver meets (missing targets, cycles, selectors that
//! match nothing or do not parse) degrades to "no inherited content" and is
//! only logged.
//!
//! [`DocGraphError`] bridges the subsystem errors, and [`OutputErrorCode`]
//! gives each a stable numeric code used as the CLI exit status.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// An input file could not be read or parsed.
    InputError = 3,
    /// The element graph could not be built.
    GraphError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Subsystem Errors
// ============================================================================

/// A documentation fragment that is not well-formed XML.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("malformed documentation fragment: {message}")]
    Malformed { message: String },
}

/// A documentation store file that cannot be loaded.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed documentation file: {message}")]
    Malformed { message: String },

    #[error("expected a <doc> root element, found <{found}>")]
    UnexpectedRoot { found: String },
}

/// Invariant violations found while building the element graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Two declared types encode to the same identifier.
    #[error("duplicate type identifier '{id}'")]
    DuplicateType { id: String },

    /// Two members of one type encode to the same identifier.
    #[error("duplicate member identifier '{member_id}' in type '{type_id}'")]
    DuplicateMember { type_id: String, member_id: String },

    /// A nested type points at a declaring type that does not exist.
    #[error("type '{name}' names declaring type #{index}, which does not exist")]
    UnknownDeclaringType { name: String, index: usize },

    /// Declaring-type links form a cycle.
    #[error("declaring-type cycle through type '{name}'")]
    DeclaringTypeCycle { name: String },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for library callers and the CLI.
#[derive(Debug, Error)]
pub enum DocGraphError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<&DocGraphError> for OutputErrorCode {
    fn from(err: &DocGraphError) -> Self {
        match err {
            DocGraphError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DocGraphError::Store(_) => OutputErrorCode::InputError,
            DocGraphError::Io { .. } => OutputErrorCode::InputError,
            DocGraphError::Json(_) => OutputErrorCode::InputError,
            DocGraphError::Graph(_) => OutputErrorCode::GraphError,
            DocGraphError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl DocGraphError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        DocGraphError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        DocGraphError::InternalError {
            message: message.into(),
        }
    }

    /// Create an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DocGraphError::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
