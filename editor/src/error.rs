//! Error types for the instance graph, documents and configuration.

use std::path::PathBuf;

use spdx_ontology::{CompileError, LoadError, MetadataError, ResolveError};
use thiserror::Error;

/// Errors raised by [`InstanceGraph`](crate::InstanceGraph) operations.
///
/// Cardinality overflow is not an error; see [`Addition`](crate::Addition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Abstract classes are never instantiated.
    #[error("class {0} is abstract and cannot be instantiated")]
    AbstractClass(String),

    /// The IRI does not name a class of the current model.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// No node with this id exists.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// The node has no property (or property instance) with this id or path.
    #[error("node {node} has no property {property}")]
    UnknownProperty {
        /// Node id.
        node: String,
        /// Property instance id or path.
        property: String,
    },

    /// No edge with this id exists.
    #[error("unknown edge: {0}")]
    UnknownEdge(String),

    /// Object properties are represented as edges, not values.
    #[error("{0} is an object property; add an edge instead")]
    ObjectPropertyAsValue(String),

    /// Edges can only instantiate object properties.
    #[error("{0} is not an object property")]
    NotAnObjectProperty(String),

    /// The edge target is not an instance of the property's target class.
    #[error("target {target} is not a {expected}")]
    TargetClassMismatch {
        /// Target node id.
        target: String,
        /// Required target class IRI.
        expected: String,
    },

    /// A node id is already in use.
    #[error("a node with id {0} already exists")]
    DuplicateNodeId(String),

    /// The class hierarchy is malformed.
    #[error("inheritance cycle through class {0}")]
    InheritanceCycle(String),
}

impl From<ResolveError> for GraphError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnknownClass(iri) => GraphError::UnknownClass(iri),
            ResolveError::InheritanceCycle(iri) => GraphError::InheritanceCycle(iri),
        }
    }
}

/// Errors raised while reading or parsing a JSON-LD context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context document is not a JSON object with an `@context` map.
    #[error("invalid JSON-LD context: {0}")]
    Invalid(String),

    /// The context document is not valid JSON.
    #[error("failed to parse JSON-LD context: {0}")]
    Json(#[from] serde_json::Error),

    /// The context document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the context document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The context URL could not be fetched.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Transport or HTTP status message.
        message: String,
    },
}

/// Errors raised while importing an SPDX document.
///
/// A failed import leaves the graph unchanged.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The document's `@context` is not the expected context URL.
    #[error("the document context has to match \"{expected}\"")]
    ContextMismatch {
        /// Expected context URL.
        expected: String,
    },

    /// The document is not valid JSON or not a JSON-LD node graph.
    #[error("failed to parse document: {0}")]
    GraphParse(String),

    /// A subject of the document is already a node of the graph.
    #[error("a node with id {0} already exists; remove it before importing")]
    DuplicateNodeId(String),

    /// A subject has no `@type`.
    #[error("subject {0} has no type")]
    MissingType(String),

    /// A predicate is not a property of the subject's class.
    #[error("{class} has no property {path}")]
    UnknownProperty {
        /// Class IRI of the subject.
        class: String,
        /// Predicate IRI.
        path: String,
    },

    /// An object value does not name a subject of the document.
    #[error("no target node found with id {0}")]
    MissingTarget(String),

    /// A graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The document could not be read.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors raised while reading the editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML of the expected shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while opening or reloading an editor session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The ontology could not be read or parsed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The ontology could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The metadata document could not be read or parsed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The class hierarchy does not resolve.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The JSON-LD context could not be read or parsed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The instance graph could not be retyped against the new model.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An option catalog could not be read.
    #[error("failed to read option catalog: {0}")]
    Catalog(#[from] csv::Error),
}
