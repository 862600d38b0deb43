//! JSON-LD term context.
//!
//! SPDX documents are compact JSON-LD: short keys such as `creationInfo`
//! or `software_packageVersion`, enumeration values such as `sha256`, and
//! `spdxId`/`type` in place of `@id`/`@type`. A [`TermContext`] holds the
//! prefixes and term definitions needed to expand those documents into
//! triples and to compact triples back. It is either read from a context
//! document or derived from the compiled model.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::{json, Map, Value};
use spdx_ontology::model::{iris, parse_iri};
use spdx_ontology::{Model, PropertyKind};
use tracing::{debug, info};

use crate::error::ContextError;

/// How a term's string values are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// Values are node identifiers (`"@type": "@id"`).
    Id,
    /// Values are vocabulary terms (`"@type": "@vocab"`).
    Vocab,
    /// Values are literals of this datatype IRI.
    Datatype(String),
}

/// One term of the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    /// Expanded IRI of the term.
    pub iri: String,
    /// Value coercion, if any.
    pub coercion: Option<Coercion>,
    /// Scoped `@vocab` used to expand vocabulary values.
    pub vocab: Option<String>,
}

/// Prefixes, terms and keyword aliases of a JSON-LD context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermContext {
    prefixes: BTreeMap<String, String>,
    terms: BTreeMap<String, TermDefinition>,
    reverse: HashMap<String, String>,
    id_alias: Option<String>,
    type_alias: Option<String>,
    vocab: Option<String>,
    source: Option<Value>,
}

impl TermContext {
    /// Parses a context document.
    ///
    /// Accepts either `{"@context": {...}}` or the bare context object.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Json`] for malformed JSON and
    /// [`ContextError::Invalid`] if no context object is found.
    pub fn from_json_str(text: &str) -> Result<Self, ContextError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Builds a context from a parsed context document.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Invalid`] if `value` holds no context object.
    pub fn from_json(value: &Value) -> Result<Self, ContextError> {
        let object = match value.get("@context") {
            Some(Value::Object(inner)) => inner,
            Some(_) => {
                return Err(ContextError::Invalid(
                    "@context must be an object".to_owned(),
                ))
            }
            None => value
                .as_object()
                .ok_or_else(|| ContextError::Invalid("expected a JSON object".to_owned()))?,
        };

        let mut ctx = Self {
            source: Some(json!({ "@context": object })),
            ..Self::default()
        };
        // Prefixes first so term IRIs may use them regardless of key order.
        for (key, entry) in object {
            match (key.as_str(), entry) {
                ("@vocab", Value::String(v)) => ctx.vocab = Some(v.clone()),
                (_, Value::String(v)) if v == "@id" => ctx.id_alias = Some(key.clone()),
                (_, Value::String(v)) if v == "@type" => ctx.type_alias = Some(key.clone()),
                (_, Value::String(v))
                    if !key.starts_with('@') && !key.contains(':') && is_namespace(v) =>
                {
                    ctx.prefixes.insert(key.clone(), v.clone());
                }
                _ => {}
            }
        }
        for (key, entry) in object {
            if key.starts_with('@') || ctx.prefixes.contains_key(key) {
                continue;
            }
            let definition = match entry {
                Value::String(v) if v.starts_with('@') => continue,
                Value::String(v) => TermDefinition {
                    iri: ctx.expand_iri(v),
                    coercion: None,
                    vocab: None,
                },
                Value::Object(def) => ctx.read_definition(key, def)?,
                _ => continue,
            };
            ctx.insert_term(key.clone(), definition);
        }
        info!(
            prefixes = ctx.prefixes.len(),
            terms = ctx.terms.len(),
            "loaded JSON-LD context"
        );
        Ok(ctx)
    }

    fn read_definition(&self, key: &str, def: &Map<String, Value>) -> Result<TermDefinition, ContextError> {
        let iri = match def.get("@id").and_then(Value::as_str) {
            Some(id) => self.expand_iri(id),
            None => self.expand_iri(key),
        };
        let coercion = match def.get("@type").and_then(Value::as_str) {
            None => None,
            Some("@id") => Some(Coercion::Id),
            Some("@vocab") => Some(Coercion::Vocab),
            Some(other) if other.starts_with('@') => {
                return Err(ContextError::Invalid(format!(
                    "unsupported @type {other} for term {key}"
                )))
            }
            Some(datatype) => Some(Coercion::Datatype(self.expand_iri(datatype))),
        };
        let vocab = def
            .get("@context")
            .and_then(|scoped| scoped.get("@vocab"))
            .and_then(Value::as_str)
            .map(|v| self.expand_iri(v));
        Ok(TermDefinition {
            iri,
            coercion,
            vocab,
        })
    }

    fn insert_term(&mut self, term: String, definition: TermDefinition) {
        self.reverse
            .entry(definition.iri.clone())
            .or_insert_with(|| term.clone());
        self.terms.entry(term).or_insert(definition);
    }

    /// Derives a context from the compiled model.
    ///
    /// Core entities are unprefixed; entities of other profiles are named
    /// `<profile lowercase>_<name>`. Object properties whose range is a
    /// vocabulary coerce to `@vocab` scoped to `<vocabulary IRI>/`, other
    /// object properties to `@id`, and datatype properties to their range.
    pub fn from_model(model: &Model) -> Self {
        let mut ctx = Self {
            id_alias: Some("spdxId".to_owned()),
            type_alias: Some("type".to_owned()),
            ..Self::default()
        };
        ctx.prefixes.insert("xsd".to_owned(), iris::XSD.to_owned());

        for (profile_name, profile) in &model.profiles {
            let prefix = profile_name.to_lowercase();
            let namespace = profile.iri.as_deref().map(|iri| {
                if is_namespace(iri) {
                    iri.to_owned()
                } else {
                    format!("{iri}/")
                }
            });
            let namespace = namespace.or_else(|| {
                let sample = profile
                    .classes
                    .values()
                    .map(|c| c.iri.as_str())
                    .chain(profile.properties.values().map(|p| p.iri.as_str()))
                    .next()?;
                let (name, _) = parse_iri(sample);
                Some(sample[..sample.len() - name.len()].to_owned())
            });
            if let Some(namespace) = namespace {
                ctx.prefixes.insert(prefix.clone(), namespace);
            }

            let term_name = |name: &str| {
                if profile_name == "Core" {
                    name.to_owned()
                } else {
                    format!("{prefix}_{name}")
                }
            };
            for class in profile.classes.values() {
                ctx.insert_term(
                    term_name(&class.name),
                    TermDefinition {
                        iri: class.iri.clone(),
                        coercion: None,
                        vocab: None,
                    },
                );
            }
            for property in profile.properties.values() {
                let (coercion, vocab) = match property.kind {
                    PropertyKind::Object => match property
                        .range
                        .as_deref()
                        .and_then(|r| model.find_vocabulary(r))
                    {
                        Some(vocabulary) => (Coercion::Vocab, Some(format!("{}/", vocabulary.iri))),
                        None => (Coercion::Id, None),
                    },
                    PropertyKind::Datatype => match &property.range {
                        Some(range) => (Coercion::Datatype(range.clone()), None),
                        None => (Coercion::Datatype(iris::XSD_STRING.to_owned()), None),
                    },
                };
                ctx.insert_term(
                    term_name(&property.name),
                    TermDefinition {
                        iri: property.iri.clone(),
                        coercion: Some(coercion),
                        vocab,
                    },
                );
            }
        }
        debug!(terms = ctx.terms.len(), "derived JSON-LD context from model");
        ctx
    }

    /// Reads a context document from a path or an `http(s)` URL.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Io`] or [`ContextError::Fetch`] if the
    /// document cannot be read, and the errors of
    /// [`from_json_str`](Self::from_json_str) if it is malformed.
    pub async fn load(source: &str) -> Result<Self, ContextError> {
        let text = if source.starts_with("http://") || source.starts_with("https://") {
            let fetch_error = |e: reqwest::Error| ContextError::Fetch {
                url: source.to_owned(),
                message: e.to_string(),
            };
            reqwest::get(source)
                .await
                .map_err(fetch_error)?
                .error_for_status()
                .map_err(fetch_error)?
                .text()
                .await
                .map_err(fetch_error)?
        } else {
            let path = Path::new(source);
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ContextError::Io {
                    path: path.to_path_buf(),
                    source,
                })?
        };
        Self::from_json_str(&text)
    }

    /// Key used for node identifiers (`spdxId` or `@id`).
    pub fn id_key(&self) -> &str {
        self.id_alias.as_deref().unwrap_or("@id")
    }

    /// Key used for node types (`type` or `@type`).
    pub fn type_key(&self) -> &str {
        self.type_alias.as_deref().unwrap_or("@type")
    }

    /// True if `key` denotes the node identifier.
    pub fn is_id_key(&self, key: &str) -> bool {
        key == "@id" || self.id_alias.as_deref() == Some(key)
    }

    /// True if `key` denotes the node type.
    pub fn is_type_key(&self, key: &str) -> bool {
        key == "@type" || self.type_alias.as_deref() == Some(key)
    }

    /// Looks up a term.
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// The term naming `iri`, with its definition.
    pub fn term_for(&self, iri: &str) -> Option<(&str, &TermDefinition)> {
        let term = self.reverse.get(iri)?;
        self.terms.get(term).map(|def| (term.as_str(), def))
    }

    /// Expands a term, compact IRI or vocabulary-relative name.
    ///
    /// Absolute IRIs (any scheme that is not a known prefix) and blank node
    /// labels are returned unchanged.
    pub fn expand_iri(&self, value: &str) -> String {
        if let Some(def) = self.terms.get(value) {
            return def.iri.clone();
        }
        if value.starts_with("_:") {
            return value.to_owned();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            return match self.prefixes.get(prefix) {
                Some(namespace) if !suffix.starts_with("//") => format!("{namespace}{suffix}"),
                _ => value.to_owned(),
            };
        }
        match &self.vocab {
            Some(vocab) => format!("{vocab}{value}"),
            None => value.to_owned(),
        }
    }

    /// Compacts an IRI to a term, else to `prefix:suffix`, else returns it.
    pub fn compact_iri(&self, iri: &str) -> String {
        if let Some(term) = self.reverse.get(iri) {
            return term.clone();
        }
        self.prefixes
            .iter()
            .filter(|(_, namespace)| iri.len() > namespace.len() && iri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map_or_else(
                || iri.to_owned(),
                |(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]),
            )
    }

    /// Compacts a value of a `@vocab`-coerced term.
    pub fn compact_vocab_value(&self, definition: &TermDefinition, iri: &str) -> String {
        match definition.vocab.as_deref().and_then(|v| iri.strip_prefix(v)) {
            Some(local) if !local.is_empty() && !local.contains(['/', ':', '#']) => local.to_owned(),
            _ => self.compact_iri(iri),
        }
    }

    /// The context document served to the JSON-LD processor: the document
    /// this context was read from, else [`to_json`](Self::to_json).
    pub fn document(&self) -> Value {
        self.source.clone().unwrap_or_else(|| self.to_json())
    }

    /// Renders the context as a JSON-LD context document.
    pub fn to_json(&self) -> Value {
        let mut ctx = Map::new();
        for (prefix, namespace) in &self.prefixes {
            ctx.insert(prefix.clone(), json!(namespace));
        }
        if let Some(vocab) = &self.vocab {
            ctx.insert("@vocab".to_owned(), json!(vocab));
        }
        if let Some(alias) = &self.id_alias {
            ctx.insert(alias.clone(), json!("@id"));
        }
        if let Some(alias) = &self.type_alias {
            ctx.insert(alias.clone(), json!("@type"));
        }
        for (term, def) in &self.terms {
            let id = self.compact_with_prefix(&def.iri);
            let entry = match (&def.coercion, &def.vocab) {
                (None, _) => json!(id),
                (Some(coercion), vocab) => {
                    let mut entry = Map::new();
                    entry.insert("@id".to_owned(), json!(id));
                    let ty = match coercion {
                        Coercion::Id => "@id".to_owned(),
                        Coercion::Vocab => "@vocab".to_owned(),
                        Coercion::Datatype(dt) => self.compact_with_prefix(dt),
                    };
                    entry.insert("@type".to_owned(), json!(ty));
                    if let Some(vocab) = vocab {
                        entry.insert(
                            "@context".to_owned(),
                            json!({ "@vocab": self.compact_with_prefix(vocab) }),
                        );
                    }
                    Value::Object(entry)
                }
            };
            ctx.insert(term.clone(), entry);
        }
        json!({ "@context": ctx })
    }

    fn compact_with_prefix(&self, iri: &str) -> String {
        self.prefixes
            .iter()
            .filter(|(_, namespace)| iri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map_or_else(
                || iri.to_owned(),
                |(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]),
            )
    }
}

fn is_namespace(value: &str) -> bool {
    value.ends_with('/') || value.ends_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{core, model, software};

    const CONTEXT: &str = r#"{
        "@context": {
            "core": "https://spdx.org/rdf/3.0.1/terms/Core/",
            "software": "https://spdx.org/rdf/3.0.1/terms/Software/",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "spdxId": "@id",
            "type": "@type",
            "Person": "core:Person",
            "software_Package": "software:Package",
            "algorithm": {
                "@id": "core:algorithm",
                "@type": "@vocab",
                "@context": { "@vocab": "core:HashAlgorithm/" }
            },
            "creationInfo": { "@id": "core:creationInfo", "@type": "@id" },
            "created": { "@id": "core:created", "@type": "xsd:dateTimeStamp" }
        }
    }"#;

    #[test]
    fn context_documents_are_read() {
        let ctx = TermContext::from_json_str(CONTEXT).unwrap();
        assert_eq!(ctx.id_key(), "spdxId");
        assert_eq!(ctx.type_key(), "type");
        assert_eq!(ctx.expand_iri("Person"), core("Person"));
        assert_eq!(ctx.expand_iri("software_Package"), software("Package"));
        assert_eq!(ctx.expand_iri("core:name"), core("name"));
        assert_eq!(ctx.expand_iri("urn:uuid:1"), "urn:uuid:1");
        assert_eq!(ctx.expand_iri("_:b0"), "_:b0");

        let created = ctx.term("created").unwrap();
        assert_eq!(
            created.coercion,
            Some(Coercion::Datatype(iris::XSD_DATE_TIME_STAMP.to_owned()))
        );
        assert_eq!(ctx.term("creationInfo").unwrap().coercion, Some(Coercion::Id));
    }

    #[test]
    fn vocabulary_values_compact_against_the_scoped_vocab() {
        let ctx = TermContext::from_json_str(CONTEXT).unwrap();
        let algorithm = ctx.term("algorithm").unwrap();
        let sha256 = core("HashAlgorithm/sha256");
        assert_eq!(algorithm.vocab.as_deref(), Some(core("HashAlgorithm/").as_str()));
        assert_eq!(ctx.compact_vocab_value(algorithm, &sha256), "sha256");
        assert_eq!(
            ctx.compact_vocab_value(algorithm, &software("SoftwarePurpose/library")),
            "software:SoftwarePurpose/library"
        );
    }

    #[test]
    fn iris_compact_to_terms_then_prefixes() {
        let ctx = TermContext::from_json_str(CONTEXT).unwrap();
        assert_eq!(ctx.compact_iri(&core("Person")), "Person");
        assert_eq!(ctx.compact_iri(&core("Agent")), "core:Agent");
        assert_eq!(ctx.compact_iri("urn:uuid:1"), "urn:uuid:1");
        assert_eq!(ctx.term_for(&core("created")).unwrap().0, "created");
    }

    #[test]
    fn bare_context_objects_are_accepted() {
        let ctx = TermContext::from_json_str(r#"{ "ex": "https://example.org/" }"#).unwrap();
        assert_eq!(ctx.expand_iri("ex:a"), "https://example.org/a");
        assert_eq!(ctx.id_key(), "@id");
        assert!(matches!(
            TermContext::from_json_str(r#"{ "@context": "https://example.org/ctx" }"#),
            Err(ContextError::Invalid(_))
        ));
    }

    #[test]
    fn derived_context_follows_spdx_naming() {
        let model = model();
        let ctx = TermContext::from_model(&model);
        assert_eq!(ctx.expand_iri("Person"), core("Person"));
        assert_eq!(ctx.compact_iri(&software("Package")), "software_Package");
        assert_eq!(
            ctx.term("software_packageVersion").unwrap().coercion,
            Some(Coercion::Datatype(iris::XSD_STRING.to_owned()))
        );
        assert_eq!(ctx.term("createdBy").unwrap().coercion, Some(Coercion::Id));
        let purpose = ctx.term("software_primaryPurpose").unwrap();
        assert_eq!(purpose.coercion, Some(Coercion::Vocab));
        assert_eq!(
            ctx.compact_vocab_value(purpose, &software("SoftwarePurpose/library")),
            "library"
        );
    }

    #[test]
    fn rendered_context_reads_back() {
        let ctx = TermContext::from_model(&model());
        let reread = TermContext::from_json(&ctx.to_json()).unwrap();
        assert_eq!(reread.term("algorithm"), ctx.term("algorithm"));
        assert_eq!(reread.term("created"), ctx.term("created"));
        assert_eq!(reread.expand_iri("expandedlicensing_License"), ctx.expand_iri("expandedlicensing_License"));
    }

    #[tokio::test]
    async fn contexts_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spdx-context.jsonld");
        std::fs::write(&path, CONTEXT).unwrap();
        let ctx = TermContext::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(ctx.expand_iri("Person"), core("Person"));
        assert!(matches!(
            TermContext::load("missing-context.jsonld").await,
            Err(ContextError::Io { .. })
        ));
    }
}
