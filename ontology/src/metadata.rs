//! Enrichment from the human-authored model description.
//!
//! The SPDX model ships a JSON document derived from its markdown sources.
//! It carries long descriptions and the `Instantiability` of each class,
//! neither of which is present in the RDF graph.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::MetadataError;
use crate::model::{parse_iri, Model};

/// Top level of the model description document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelMetadata {
    /// Profiles keyed by an arbitrary identifier; matched on `name`.
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceMetadata>,
}

/// One profile of the model description document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamespaceMetadata {
    /// Profile name, e.g. `"Core"`.
    pub name: String,
    /// Profile namespace IRI.
    pub iri: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Class descriptions.
    pub classes: BTreeMap<String, ItemMetadata>,
    /// Property descriptions.
    pub properties: BTreeMap<String, ItemMetadata>,
    /// Vocabulary descriptions.
    pub vocabularies: BTreeMap<String, ItemMetadata>,
    /// Individual descriptions.
    pub individuals: BTreeMap<String, ItemMetadata>,
}

/// One entity of the model description document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemMetadata {
    /// Entity name; matched against the compiled entity's name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Free-form metadata table (`Instantiability`, `SubclassOf`, ...).
    pub metadata: BTreeMap<String, Value>,
}

impl ItemMetadata {
    /// True if the metadata table marks the entity abstract.
    pub fn is_abstract(&self) -> bool {
        self.metadata
            .get("Instantiability")
            .and_then(Value::as_str)
            .is_some_and(|v| v == "Abstract")
    }
}

impl NamespaceMetadata {
    fn find<'a>(
        section: &'a BTreeMap<String, ItemMetadata>,
        name: &str,
    ) -> Option<&'a ItemMetadata> {
        section.values().find(|item| item.name == name)
    }
}

impl ModelMetadata {
    /// Parses a metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`] if the JSON does not match the
    /// expected shape.
    pub fn from_json_str(text: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a metadata document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Io`] if the file cannot be read and
    /// [`MetadataError::Parse`] if it is malformed.
    pub async fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MetadataError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&text)
    }

    /// Looks up a profile by name.
    pub fn namespace(&self, name: &str) -> Option<&NamespaceMetadata> {
        self.namespaces.values().find(|ns| ns.name == name)
    }
}

impl Model {
    /// Copies descriptions, abstractness and profile metadata into the model.
    ///
    /// Profiles and entities without a counterpart in `metadata` keep their
    /// compiled fields.
    pub fn enrich(&mut self, metadata: &ModelMetadata) {
        let mut matched = 0usize;
        for (profile_name, profile) in &mut self.profiles {
            let Some(ns) = metadata.namespace(profile_name) else {
                debug!(profile = %profile_name, "no metadata for profile");
                continue;
            };
            if let Some(iri) = &ns.iri {
                profile.iri = Some(iri.clone());
                profile.name = Some(parse_iri(iri.trim_end_matches('/')).0.to_owned());
            }
            profile.summary = ns.summary.clone();
            profile.description = ns.description.clone();

            for (name, class) in &mut profile.classes {
                if let Some(item) = NamespaceMetadata::find(&ns.classes, name) {
                    let class = Arc::make_mut(class);
                    class.description = item.description.clone();
                    class.is_abstract = item.is_abstract();
                    matched += 1;
                }
            }
            for (name, property) in &mut profile.properties {
                if let Some(item) = NamespaceMetadata::find(&ns.properties, name) {
                    Arc::make_mut(property).description = item.description.clone();
                    matched += 1;
                }
            }
            for (name, vocabulary) in &mut profile.vocabularies {
                if let Some(item) = NamespaceMetadata::find(&ns.vocabularies, name) {
                    Arc::make_mut(vocabulary).description = item.description.clone();
                    matched += 1;
                }
            }
            for (name, individual) in &mut profile.individuals {
                if let Some(item) = NamespaceMetadata::find(&ns.individuals, name) {
                    Arc::make_mut(individual).description = item.description.clone();
                    matched += 1;
                }
            }
        }
        self.reindex();
        info!(entities = matched, "enriched model from metadata");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Class, OntologyInfo, Profile};

    const DOC: &str = r#"{
        "namespaces": {
            "core": {
                "name": "Core",
                "iri": "https://spdx.org/rdf/3.0.1/terms/Core/",
                "summary": "Core profile",
                "description": "Everything else builds on this.",
                "classes": {
                    "Element": {
                        "name": "Element",
                        "description": "Base of all elements.",
                        "metadata": { "Instantiability": "Abstract" }
                    }
                }
            }
        }
    }"#;

    fn class(name: &str) -> Arc<Class> {
        Arc::new(Class {
            iri: format!("https://spdx.org/rdf/3.0.1/terms/Core/{name}"),
            name: name.into(),
            profile_name: "Core".into(),
            summary: None,
            description: None,
            is_abstract: false,
            sub_class_of: None,
            properties: BTreeMap::new(),
        })
    }

    fn model() -> Model {
        let mut core = Profile::default();
        core.classes.insert("Element".into(), class("Element"));
        core.classes.insert("Agent".into(), class("Agent"));
        let mut profiles = BTreeMap::new();
        profiles.insert("Core".into(), core);
        profiles.insert("Extra".into(), Profile::default());
        Model::from_profiles(OntologyInfo::default(), profiles)
    }

    #[test]
    fn classes_receive_description_and_abstractness() {
        let metadata = ModelMetadata::from_json_str(DOC).unwrap();
        let mut model = model();
        model.enrich(&metadata);

        let element = model
            .find_class("https://spdx.org/rdf/3.0.1/terms/Core/Element")
            .unwrap();
        assert!(element.is_abstract);
        assert_eq!(element.description.as_deref(), Some("Base of all elements."));

        let agent = model
            .find_class("https://spdx.org/rdf/3.0.1/terms/Core/Agent")
            .unwrap();
        assert!(!agent.is_abstract);
        assert!(agent.description.is_none());
    }

    #[test]
    fn profile_fields_are_copied() {
        let metadata = ModelMetadata::from_json_str(DOC).unwrap();
        let mut model = model();
        model.enrich(&metadata);
        let core = &model.profiles["Core"];
        assert_eq!(core.name.as_deref(), Some("Core"));
        assert_eq!(core.summary.as_deref(), Some("Core profile"));
        assert!(model.profiles["Extra"].iri.is_none());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            ModelMetadata::from_json_str("{\"namespaces\": []}"),
            Err(MetadataError::Parse(_))
        ));
    }
}
