//! SPDX instance graph editor engine.
//!
//! The `spdx-editor` crate holds user-built SPDX documents as a graph of
//! typed nodes. Every node is an instance of a compiled ontology class; its
//! literal and vocabulary values are stored as node properties and its
//! object-valued properties as edges to other nodes. Each mutation re-checks
//! value validity, minimum and maximum cardinality, and edge target classes.
//!
//! Documents travel as compacted JSON-LD under the SPDX context.
//!
//! # Entry Point
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use spdx_editor::{EditorConfig, EditorSession, Position};
//! use spdx_ontology::Source;
//!
//! let mut session =
//!     EditorSession::open(EditorConfig::default(), &Source::parse("spdx-model.ttl"), None).await?;
//! let person = session
//!     .graph_mut()
//!     .add_node("https://spdx.org/rdf/3.0.1/terms/Core/Person", Position::default())?;
//! println!("{person}: {} failures", session.graph().validate().failure_count());
//! println!("{}", session.export().to_json_string()?);
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod catalog;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use catalog::OptionCatalog;
pub use codec::{export_document, export_nodes, import_document, ExportedDocument, ImportSummary};
pub use config::EditorConfig;
pub use context::{Coercion, TermContext, TermDefinition};
pub use error::{ConfigError, ContextError, GraphError, ImportError, SessionError};
pub use graph::{
    generate_urn, Addition, Edge, GraphSettings, InstanceGraph, Node, NodeProperty, Position,
};
pub use session::{load_model, EditorSession};
pub use validation::{Finding, Severity, ValidationReport};
