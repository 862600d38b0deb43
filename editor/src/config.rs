//! Editor configuration.
//!
//! Read from TOML; every key has a default, so an empty file (or no file at
//! all) yields a working configuration:
//!
//! ```toml
//! context_url = "https://spdx.org/rdf/3.0.1/spdx-context.jsonld"
//! grid = [260.0, 82.0]
//! element_class = "Core/Element"
//! document_class = "SpdxDocument"
//! # spec_version = "3.0.1"
//! # context_source = "spdx-context.jsonld"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default expected `@context` of SPDX 3 documents.
pub const DEFAULT_CONTEXT_URL: &str = "https://spdx.org/rdf/3.0.1/spdx-context.jsonld";

/// Default layout grid unit (width, height).
pub const DEFAULT_GRID: [f64; 2] = [260.0, 82.0];

/// Settings shared by the graph, the codec and the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Expected `@context` of imported documents; written into exports.
    pub context_url: String,
    /// Grid unit used to express `dots` positions.
    pub grid: [f64; 2],
    /// `profile/name` of the class whose descendants get URN subjects.
    pub element_class: String,
    /// Class name of the node reported as the import root.
    pub document_class: String,
    /// Overrides the ontology version prefilled into `specVersion`.
    pub spec_version: Option<String>,
    /// Path or URL of the JSON-LD context document.
    pub context_source: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            context_url: DEFAULT_CONTEXT_URL.to_owned(),
            grid: DEFAULT_GRID,
            element_class: "Core/Element".to_owned(),
            document_class: "SpdxDocument".to_owned(),
            spec_version: None,
            context_source: None,
        }
    }
}

impl EditorConfig {
    /// Parses a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown keys or
    /// wrongly typed values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub async fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&text)
    }

    /// Splits `element_class` into `(profile, name)`.
    pub fn element_class_parts(&self) -> (&str, &str) {
        match self.element_class.split_once('/') {
            Some((profile, name)) => (profile, name),
            None => ("", self.element_class.as_str()),
        }
    }
}
