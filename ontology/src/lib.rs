//! SPDX ontology model compiler.
//!
//! The `spdx-ontology` crate turns an RDF/OWL/SHACL description of the SPDX
//! model into typed Rust data: classes with their SHACL property shapes,
//! datatype and object properties, vocabularies, and named individuals,
//! grouped by profile and indexed by IRI. On top of the compiled model the
//! [`Resolver`] computes the recursive (own + inherited) property sets used to
//! type instance nodes.
//!
//! # Entry Point
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use spdx_ontology::{compile, load_graph, Resolver, Source};
//! use std::sync::Arc;
//!
//! let store = load_graph(&Source::parse("spdx-model.ttl")).await?;
//! let model = Arc::new(compile(&store)?);
//! let resolver = Resolver::new(model);
//! resolver.warm()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! ```text
//! Source --load_graph--> TripleStore --compile--> Model --Resolver--> RecursiveProperties
//!                                                  ^
//!                                  ModelMetadata --+ (enrich)
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod compiler;
pub mod datatype;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod resolver;
pub mod serializer;
pub mod store;

pub use compiler::compile;
pub use datatype::{LiteralType, PropertyValue};
pub use error::{CompileError, LoadError, MetadataError, ResolveError};
pub use loader::{load_graph, parse_graph, parse_jsonld, Format, Source};
pub use metadata::ModelMetadata;
pub use model::{
    Class, ClassProperty, ClassPropertyKind, Individual, Item, Model, NodeKind, OntologyInfo,
    Profile, Property, PropertyKind, PropertyOption, Vocabulary, VocabularyEntry,
};
pub use resolver::{ClassPropertySet, RecursiveProperties, Resolver};
pub use store::{Term, Triple, TripleStore};
