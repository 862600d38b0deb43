//! Error types for loading, compiling and resolving ontologies.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading and parsing an RDF source.
///
/// A load that fails never exposes a partially filled store.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source name does not end in `.ttl`, `.jsonld` or `.json-ld`.
    #[error("unsupported source format: {0:?}")]
    UnsupportedFormat(String),

    /// The underlying RDF parser rejected the document.
    #[error("failed to parse graph: {0}")]
    GraphParse(String),

    /// The source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source URL could not be fetched.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Transport or HTTP status message.
        message: String,
    },
}

/// Errors raised while compiling a triple store into a [`Model`](crate::Model).
#[derive(Debug, Error)]
pub enum CompileError {
    /// Following `rdfs:subClassOf` from the named class revisits a class.
    #[error("inheritance cycle through class {0}")]
    InheritanceCycle(String),
}

/// Errors raised by the [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The IRI does not name a class of the current model.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// Following `subClassOf` from the named class revisits a class.
    #[error("inheritance cycle through class {0}")]
    InheritanceCycle(String),
}

/// Errors raised while reading the metadata enrichment document.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the metadata file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata document is not valid JSON of the expected shape.
    #[error("invalid metadata document: {0}")]
    Parse(#[from] serde_json::Error),
}
