//! Compiled ontology model types.
//!
//! A [`Model`] is built once per ontology load by [`compile`](crate::compile)
//! and never mutated afterwards except for metadata enrichment before it is
//! shared. Entities are reference counted so instance nodes can hold on to
//! the class and class properties they were typed with.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::datatype::LiteralType;

/// Classification of a property's value shape (`sh:nodeKind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// A literal value.
    Literal,
    /// A named individual of an enumeration.
    #[serde(rename = "IRI")]
    Iri,
    /// A reference to another instance.
    #[serde(rename = "BlankNodeOrIRI")]
    BlankNodeOrIri,
}

impl NodeKind {
    /// Parses the local name of a `sh:nodeKind` value.
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "Literal" => Some(NodeKind::Literal),
            "IRI" => Some(NodeKind::Iri),
            "BlankNodeOrIRI" => Some(NodeKind::BlankNodeOrIri),
            _ => None,
        }
    }
}

/// One selectable member of an enumerated property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOption {
    /// Display label (last IRI segment).
    pub label: String,
    /// Full IRI of the option.
    pub value: String,
}

impl PropertyOption {
    /// Builds an option from an IRI, labelled with its last path segment.
    pub fn from_iri(iri: &str) -> Self {
        Self {
            label: parse_iri(iri).0.to_owned(),
            value: iri.to_owned(),
        }
    }
}

/// The value constraint of a class property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "nodeKind")]
pub enum ClassPropertyKind {
    /// A literal validated by a datatype.
    Literal {
        /// Lexical datatype.
        datatype: LiteralType,
    },
    /// One of an enumerated set of IRIs.
    #[serde(rename = "IRI")]
    Enumerated {
        /// Allowed values from `sh:in`.
        options: Vec<PropertyOption>,
    },
    /// A reference to an instance of `target_class`; represented as edges.
    #[serde(rename = "BlankNodeOrIRI", rename_all = "camelCase")]
    Object {
        /// IRI of the class of reachable objects.
        target_class: String,
    },
}

/// A SHACL property shape attached to a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassProperty {
    /// IRI of the class whose node shape declares this property.
    pub parent_class: String,
    /// IRI of the underlying [`Property`].
    pub path: String,
    /// Last segment of `path`.
    pub name: String,
    /// `sh:minCount`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
    /// `sh:maxCount`, if any. Absent means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// Value constraint.
    #[serde(flatten)]
    pub kind: ClassPropertyKind,
}

impl ClassProperty {
    /// The SHACL node kind of this property.
    pub fn node_kind(&self) -> NodeKind {
        match self.kind {
            ClassPropertyKind::Literal { .. } => NodeKind::Literal,
            ClassPropertyKind::Enumerated { .. } => NodeKind::Iri,
            ClassPropertyKind::Object { .. } => NodeKind::BlankNodeOrIri,
        }
    }

    /// True for object properties, which are instantiated as edges.
    pub fn is_object(&self) -> bool {
        matches!(self.kind, ClassPropertyKind::Object { .. })
    }

    /// True if at least one value is required.
    pub fn is_required(&self) -> bool {
        self.min_count.is_some_and(|m| m >= 1)
    }

    /// Target class IRI of an object property.
    pub fn target_class(&self) -> Option<&str> {
        match &self.kind {
            ClassPropertyKind::Object { target_class } => Some(target_class),
            _ => None,
        }
    }

    /// Datatype of a literal property.
    pub fn datatype(&self) -> Option<LiteralType> {
        match self.kind {
            ClassPropertyKind::Literal { datatype } => Some(datatype),
            _ => None,
        }
    }

    /// Options of an enumerated property.
    pub fn options(&self) -> Option<&[PropertyOption]> {
        match &self.kind {
            ClassPropertyKind::Enumerated { options } => Some(options),
            _ => None,
        }
    }
}

/// An instantiable (or abstract) class of the ontology.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    /// Full IRI.
    pub iri: String,
    /// Last IRI segment.
    pub name: String,
    /// Second-to-last IRI segment.
    pub profile_name: String,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Abstract classes are never instantiated.
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Parent class IRI. SPDX uses single inheritance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_class_of: Option<String>,
    /// Properties declared directly on this class, keyed by name.
    pub properties: BTreeMap<String, Arc<ClassProperty>>,
}

/// Whether a property relates to a literal or to another resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    /// `owl:DatatypeProperty`.
    Datatype,
    /// `owl:ObjectProperty`.
    Object,
}

/// An OWL property definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Full IRI.
    pub iri: String,
    /// Last IRI segment.
    pub name: String,
    /// Second-to-last IRI segment.
    pub profile_name: String,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Datatype or object property.
    pub kind: PropertyKind,
    /// Full IRI of `rdfs:range`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl Property {
    /// Local name of the range of a datatype property (e.g. `"dateTimeStamp"`).
    pub fn datatype(&self) -> Option<&str> {
        match self.kind {
            PropertyKind::Datatype => self.range.as_deref().map(local_name),
            PropertyKind::Object => None,
        }
    }
}

/// A member of a [`Vocabulary`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// Full IRI.
    pub iri: String,
    /// Last IRI segment.
    pub name: String,
    /// Second-to-last IRI segment (the vocabulary name).
    pub profile_name: String,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// An enumeration class whose instances are its entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    /// Full IRI.
    pub iri: String,
    /// Last IRI segment.
    pub name: String,
    /// Second-to-last IRI segment.
    pub profile_name: String,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Entries keyed by IRI.
    pub entries: BTreeMap<String, VocabularyEntry>,
}

/// A named individual with a declared range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    /// Full IRI.
    pub iri: String,
    /// Last IRI segment.
    pub name: String,
    /// Second-to-last IRI segment.
    pub profile_name: String,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full IRI of `rdfs:range`.
    pub range: String,
}

/// All entities of one profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Profile {
    /// Profile namespace IRI, from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iri: Option<String>,
    /// Profile display name, from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile summary, from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Profile description, from the metadata document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Classes keyed by name.
    pub classes: BTreeMap<String, Arc<Class>>,
    /// Properties keyed by name.
    pub properties: BTreeMap<String, Arc<Property>>,
    /// Vocabularies keyed by name.
    pub vocabularies: BTreeMap<String, Arc<Vocabulary>>,
    /// Individuals keyed by name.
    pub individuals: BTreeMap<String, Arc<Individual>>,
}

/// Any entity reachable through the IRI index.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Item {
    /// A class.
    Class(Arc<Class>),
    /// A property.
    Property(Arc<Property>),
    /// A vocabulary.
    Vocabulary(Arc<Vocabulary>),
    /// An individual.
    Individual(Arc<Individual>),
}

impl Item {
    /// Full IRI of the entity.
    pub fn iri(&self) -> &str {
        match self {
            Item::Class(c) => &c.iri,
            Item::Property(p) => &p.iri,
            Item::Vocabulary(v) => &v.iri,
            Item::Individual(i) => &i.iri,
        }
    }

    /// Name of the entity.
    pub fn name(&self) -> &str {
        match self {
            Item::Class(c) => &c.name,
            Item::Property(p) => &p.name,
            Item::Vocabulary(v) => &v.name,
            Item::Individual(i) => &i.name,
        }
    }
}

/// Ontology-level metadata from the `owl:Ontology` subject.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OntologyInfo {
    /// IRI of the `owl:Ontology` subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iri: Option<String>,
    /// `owl:versionInfo`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `rdfs:comment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A compiled, profile-grouped ontology with a flat IRI index.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Ontology-level metadata.
    pub info: OntologyInfo,
    /// Entities grouped by profile name.
    pub profiles: BTreeMap<String, Profile>,
    iris: BTreeMap<String, Item>,
}

impl Model {
    /// Builds a model and its IRI index from profile-grouped entities.
    pub fn from_profiles(info: OntologyInfo, profiles: BTreeMap<String, Profile>) -> Self {
        let mut model = Self {
            info,
            profiles,
            iris: BTreeMap::new(),
        };
        model.reindex();
        model
    }

    /// Rebuilds the IRI index after the profiles changed.
    pub(crate) fn reindex(&mut self) {
        let mut iris = BTreeMap::new();
        for profile in self.profiles.values() {
            for c in profile.classes.values() {
                iris.insert(c.iri.clone(), Item::Class(Arc::clone(c)));
            }
            for p in profile.properties.values() {
                iris.insert(p.iri.clone(), Item::Property(Arc::clone(p)));
            }
            for v in profile.vocabularies.values() {
                iris.insert(v.iri.clone(), Item::Vocabulary(Arc::clone(v)));
            }
            for i in profile.individuals.values() {
                iris.insert(i.iri.clone(), Item::Individual(Arc::clone(i)));
            }
        }
        self.iris = iris;
    }

    /// The flat IRI → entity index.
    pub fn iris(&self) -> &BTreeMap<String, Item> {
        &self.iris
    }

    /// Looks up any entity by IRI.
    #[must_use]
    pub fn find_item(&self, iri: &str) -> Option<&Item> {
        self.iris.get(iri)
    }

    /// Looks up a class by its full IRI. Returns `None` if not found.
    #[must_use]
    pub fn find_class(&self, iri: &str) -> Option<&Arc<Class>> {
        match self.iris.get(iri) {
            Some(Item::Class(c)) => Some(c),
            _ => None,
        }
    }

    /// Looks up a property by its full IRI. Returns `None` if not found.
    #[must_use]
    pub fn find_property(&self, iri: &str) -> Option<&Arc<Property>> {
        match self.iris.get(iri) {
            Some(Item::Property(p)) => Some(p),
            _ => None,
        }
    }

    /// Looks up a vocabulary by its full IRI. Returns `None` if not found.
    #[must_use]
    pub fn find_vocabulary(&self, iri: &str) -> Option<&Arc<Vocabulary>> {
        match self.iris.get(iri) {
            Some(Item::Vocabulary(v)) => Some(v),
            _ => None,
        }
    }

    /// Looks up a class by profile and name (e.g. `("Core", "Element")`).
    #[must_use]
    pub fn find_class_by_name(&self, profile: &str, name: &str) -> Option<&Arc<Class>> {
        self.profiles.get(profile)?.classes.get(name)
    }

    /// Iterates every class across all profiles.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<Class>> {
        self.profiles.values().flat_map(|p| p.classes.values())
    }

    /// Returns the total number of classes across all profiles.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.profiles.values().map(|p| p.classes.len()).sum()
    }

    /// Returns the total number of properties across all profiles.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.profiles.values().map(|p| p.properties.len()).sum()
    }

    /// Returns the total number of vocabularies across all profiles.
    #[must_use]
    pub fn vocabulary_count(&self) -> usize {
        self.profiles.values().map(|p| p.vocabularies.len()).sum()
    }

    /// Returns the total number of individuals across all profiles.
    #[must_use]
    pub fn individual_count(&self) -> usize {
        self.profiles.values().map(|p| p.individuals.len()).sum()
    }
}

/// Splits an IRI into `(name, profile)`: its last and second-to-last path
/// segments.
pub fn parse_iri(iri: &str) -> (&str, &str) {
    let mut segments = iri.rsplit('/');
    let name = segments.next().unwrap_or_default();
    let profile = segments.next().unwrap_or_default();
    (name, profile)
}

/// The part of an IRI after its last `#`, or the whole IRI.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit('#').next().unwrap_or(iri)
}

/// Standard IRI constants.
pub mod iris {
    /// OWL namespace.
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    /// RDF namespace.
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// RDFS namespace.
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// XSD namespace.
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// SHACL namespace.
    pub const SH: &str = "http://www.w3.org/ns/shacl#";

    /// `rdf:type`.
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `rdf:first`.
    pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    /// `rdf:rest`.
    pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    /// `rdf:nil`.
    pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    /// `rdf:langString`.
    pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    /// `rdfs:comment`.
    pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    /// `rdfs:subClassOf`.
    pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    /// `rdfs:range`.
    pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
    /// `owl:Class`.
    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    /// `owl:Ontology`.
    pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
    /// `owl:DatatypeProperty`.
    pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
    /// `owl:ObjectProperty`.
    pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    /// `owl:NamedIndividual`.
    pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
    /// `owl:versionInfo`.
    pub const OWL_VERSION_INFO: &str = "http://www.w3.org/2002/07/owl#versionInfo";
    /// `sh:property`.
    pub const SH_PROPERTY: &str = "http://www.w3.org/ns/shacl#property";

    /// `xsd:string`.
    pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:boolean`.
    pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:decimal`.
    pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    /// `xsd:anyURI`.
    pub const XSD_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
    /// `xsd:dateTimeStamp`.
    pub const XSD_DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";
    /// `xsd:positiveInteger`.
    pub const XSD_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    /// `xsd:nonNegativeInteger`.
    pub const XSD_NON_NEGATIVE_INTEGER: &str =
        "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
}
