//! Ontology model compiler.
//!
//! Walks a [`TripleStore`] holding an OWL/SHACL description of the SPDX model
//! and produces a profile-grouped [`Model`]:
//!
//! - `owl:Class` subjects never used as an `rdf:type` become [`Class`]es,
//!   with their `sh:property` shapes compiled into [`ClassProperty`]s
//! - `owl:Class` subjects that are used as a type become [`Vocabulary`]s
//!   whose instances are the entries
//! - `owl:DatatypeProperty` / `owl:ObjectProperty` subjects form the global
//!   [`Property`] registry
//! - `owl:NamedIndividual` subjects with an `rdfs:range` become
//!   [`Individual`]s
//!
//! Partial SHACL shapes are skipped with a warning. The input store is never
//! mutated.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::datatype::{
    LiteralType, DATE_TIME_STAMP_PATTERN, MEDIA_TYPE_PATTERN, SEMVER_PATTERN,
};
use crate::error::CompileError;
use crate::model::iris::{
    OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_NAMED_INDIVIDUAL, OWL_OBJECT_PROPERTY, OWL_ONTOLOGY,
    OWL_VERSION_INFO, RDFS_COMMENT, RDFS_RANGE, RDFS_SUBCLASS_OF, RDF_TYPE, SH_PROPERTY,
};
use crate::model::{
    local_name, parse_iri, Class, ClassProperty, ClassPropertyKind, Individual, Model, NodeKind,
    OntologyInfo, Profile, Property, PropertyKind, PropertyOption, Vocabulary, VocabularyEntry,
};
use crate::store::{Term, TripleStore};

/// Compiles an ontology graph into a [`Model`].
///
/// # Errors
///
/// Returns [`CompileError::InheritanceCycle`] if `rdfs:subClassOf` links
/// form a cycle.
pub fn compile(store: &TripleStore) -> Result<Model, CompileError> {
    let mut profiles: BTreeMap<String, Profile> = BTreeMap::new();

    let properties = compile_properties(store);
    for property in properties.values() {
        profile_mut(&mut profiles, &property.profile_name)
            .properties
            .insert(property.name.clone(), Arc::clone(property));
    }

    let owl_class = Term::iri(OWL_CLASS);
    let (class_terms, vocabulary_terms): (Vec<&Term>, Vec<&Term>) = store
        .subjects_with(RDF_TYPE, &owl_class)
        .into_iter()
        .filter(|t| t.as_iri().is_some())
        .partition(|t| !store.is_used_as_type(t));

    let class_iris: HashSet<&str> = class_terms.iter().filter_map(|t| t.as_iri()).collect();
    let classes = compile_classes(store, &class_terms, &class_iris, &properties);
    check_acyclic(&classes)?;
    for class in classes.values() {
        profile_mut(&mut profiles, &class.profile_name)
            .classes
            .insert(class.name.clone(), Arc::clone(class));
    }

    for term in vocabulary_terms {
        let vocabulary = compile_vocabulary(store, term);
        profile_mut(&mut profiles, &vocabulary.profile_name)
            .vocabularies
            .insert(vocabulary.name.clone(), Arc::new(vocabulary));
    }

    for term in store.subjects_with(RDF_TYPE, &Term::iri(OWL_NAMED_INDIVIDUAL)) {
        let (Some(iri), Some(range)) = (
            term.as_iri(),
            store.object(term, RDFS_RANGE).and_then(Term::as_iri),
        ) else {
            continue;
        };
        let (name, profile_name) = parse_iri(iri);
        let individual = Individual {
            iri: iri.to_owned(),
            name: name.to_owned(),
            profile_name: profile_name.to_owned(),
            summary: comment(store, term),
            description: None,
            range: range.to_owned(),
        };
        profile_mut(&mut profiles, profile_name)
            .individuals
            .insert(individual.name.clone(), Arc::new(individual));
    }

    let model = Model::from_profiles(ontology_info(store), profiles);
    info!(
        profiles = model.profiles.len(),
        classes = model.class_count(),
        properties = model.property_count(),
        vocabularies = model.vocabulary_count(),
        individuals = model.individual_count(),
        "compiled ontology model"
    );
    Ok(model)
}

fn profile_mut<'a>(profiles: &'a mut BTreeMap<String, Profile>, name: &str) -> &'a mut Profile {
    profiles.entry(name.to_owned()).or_default()
}

fn comment(store: &TripleStore, subject: &Term) -> Option<String> {
    store
        .object(subject, RDFS_COMMENT)
        .and_then(Term::as_lexical)
        .map(str::to_owned)
}

fn ontology_info(store: &TripleStore) -> OntologyInfo {
    let Some(subject) = store
        .subjects_with(RDF_TYPE, &Term::iri(OWL_ONTOLOGY))
        .into_iter()
        .next()
    else {
        return OntologyInfo::default();
    };
    OntologyInfo {
        iri: subject.as_iri().map(str::to_owned),
        version: store
            .object(subject, OWL_VERSION_INFO)
            .and_then(Term::as_lexical)
            .map(str::to_owned),
        summary: comment(store, subject),
    }
}

fn compile_properties(store: &TripleStore) -> BTreeMap<String, Arc<Property>> {
    let mut properties = BTreeMap::new();
    for (type_iri, kind) in [
        (OWL_DATATYPE_PROPERTY, PropertyKind::Datatype),
        (OWL_OBJECT_PROPERTY, PropertyKind::Object),
    ] {
        for term in store.subjects_with(RDF_TYPE, &Term::iri(type_iri)) {
            let Some(iri) = term.as_iri() else { continue };
            let (name, profile_name) = parse_iri(iri);
            let property = Property {
                iri: iri.to_owned(),
                name: name.to_owned(),
                profile_name: profile_name.to_owned(),
                summary: comment(store, term),
                description: None,
                kind,
                range: store
                    .object(term, RDFS_RANGE)
                    .and_then(Term::as_iri)
                    .map(str::to_owned),
            };
            properties.insert(property.iri.clone(), Arc::new(property));
        }
    }
    properties
}

fn compile_classes(
    store: &TripleStore,
    terms: &[&Term],
    class_iris: &HashSet<&str>,
    properties: &BTreeMap<String, Arc<Property>>,
) -> BTreeMap<String, Arc<Class>> {
    let mut classes = BTreeMap::new();
    for term in terms {
        let Some(iri) = term.as_iri() else { continue };
        let (name, profile_name) = parse_iri(iri);
        let sub_class_of = match store.object(term, RDFS_SUBCLASS_OF).and_then(Term::as_iri) {
            Some(parent) if class_iris.contains(parent) => Some(parent.to_owned()),
            Some(parent) => {
                warn!(class = iri, parent, "ignoring subClassOf to an unknown class");
                None
            }
            None => None,
        };
        let class_properties = store
            .objects(term, SH_PROPERTY)
            .filter_map(|shape| compile_shape(store, iri, shape, class_iris, properties))
            .map(|cp| (cp.name.clone(), Arc::new(cp)))
            .collect();
        let class = Class {
            iri: iri.to_owned(),
            name: name.to_owned(),
            profile_name: profile_name.to_owned(),
            summary: comment(store, term),
            description: None,
            is_abstract: false,
            sub_class_of,
            properties: class_properties,
        };
        classes.insert(class.iri.clone(), Arc::new(class));
    }
    classes
}

#[derive(Default)]
struct ShapeFields {
    path: Option<String>,
    min_count: Option<u32>,
    max_count: Option<u32>,
    node_kind: Option<NodeKind>,
    datatype: Option<String>,
    pattern_type: Option<LiteralType>,
    class: Option<String>,
    options: Option<Vec<PropertyOption>>,
}

fn read_shape(store: &TripleStore, class_iri: &str, shape: &Term) -> ShapeFields {
    let mut fields = ShapeFields::default();
    for triple in store.triples_of(shape) {
        let object = &triple.object;
        match local_name(&triple.predicate) {
            "path" => fields.path = object.as_iri().map(str::to_owned),
            "minCount" => fields.min_count = object.as_lexical().and_then(|v| v.parse().ok()),
            "maxCount" => fields.max_count = object.as_lexical().and_then(|v| v.parse().ok()),
            "in" => {
                fields.options = store.list(object).map(|items| {
                    items
                        .iter()
                        .filter_map(Term::as_iri)
                        .map(PropertyOption::from_iri)
                        .collect()
                });
            }
            "nodeKind" => {
                fields.node_kind = object
                    .as_iri()
                    .and_then(|v| NodeKind::from_local_name(local_name(v)));
            }
            "datatype" => fields.datatype = object.as_iri().map(|v| local_name(v).to_owned()),
            "pattern" => match object.as_lexical() {
                Some(SEMVER_PATTERN) => fields.pattern_type = Some(LiteralType::SemVer),
                Some(MEDIA_TYPE_PATTERN) => fields.pattern_type = Some(LiteralType::MediaType),
                Some(DATE_TIME_STAMP_PATTERN) => {}
                other => warn!(class = class_iri, pattern = ?other, "ignoring unknown sh:pattern"),
            },
            "class" => fields.class = object.as_iri().map(str::to_owned),
            "type" => {}
            other => warn!(class = class_iri, field = other, "ignoring unknown shape field"),
        }
    }
    fields
}

fn compile_shape(
    store: &TripleStore,
    class_iri: &str,
    shape: &Term,
    class_iris: &HashSet<&str>,
    properties: &BTreeMap<String, Arc<Property>>,
) -> Option<ClassProperty> {
    let fields = read_shape(store, class_iri, shape);
    let Some(path) = fields.path else {
        warn!(class = class_iri, "skipping property shape without sh:path");
        return None;
    };
    if !properties.contains_key(&path) {
        warn!(class = class_iri, path = %path, "skipping property shape with unknown path");
        return None;
    }

    let node_kind = fields.node_kind.or(if fields.options.is_some() {
        Some(NodeKind::Iri)
    } else if fields.class.is_some() {
        Some(NodeKind::BlankNodeOrIri)
    } else if fields.datatype.is_some() {
        Some(NodeKind::Literal)
    } else {
        None
    });

    let kind = match (node_kind, fields.options, fields.class) {
        (Some(NodeKind::Literal), _, _) => {
            let datatype = fields
                .pattern_type
                .or_else(|| fields.datatype.as_deref().and_then(LiteralType::from_local_name));
            match datatype {
                Some(datatype) => ClassPropertyKind::Literal { datatype },
                None => {
                    warn!(
                        class = class_iri,
                        path = %path,
                        datatype = ?fields.datatype,
                        "skipping literal shape with unsupported datatype"
                    );
                    return None;
                }
            }
        }
        (Some(_), Some(options), _) => ClassPropertyKind::Enumerated { options },
        (Some(_), None, Some(target_class)) => {
            if !class_iris.contains(target_class.as_str()) {
                warn!(
                    class = class_iri,
                    path = %path,
                    target = %target_class,
                    "skipping shape whose sh:class is not a class"
                );
                return None;
            }
            ClassPropertyKind::Object { target_class }
        }
        _ => {
            warn!(class = class_iri, path = %path, "skipping unclassifiable property shape");
            return None;
        }
    };

    let name = parse_iri(&path).0.to_owned();
    debug!(class = class_iri, property = %name, "compiled property shape");
    Some(ClassProperty {
        parent_class: class_iri.to_owned(),
        name,
        path,
        min_count: fields.min_count,
        max_count: fields.max_count,
        kind,
    })
}

fn compile_vocabulary(store: &TripleStore, term: &Term) -> Vocabulary {
    let iri = term.as_iri().unwrap_or_default();
    let (name, profile_name) = parse_iri(iri);
    let entries = store
        .subjects_with(RDF_TYPE, term)
        .into_iter()
        .filter_map(|entry| {
            let entry_iri = entry.as_iri()?;
            let (entry_name, vocabulary_name) = parse_iri(entry_iri);
            Some((
                entry_iri.to_owned(),
                VocabularyEntry {
                    iri: entry_iri.to_owned(),
                    name: entry_name.to_owned(),
                    profile_name: vocabulary_name.to_owned(),
                    summary: comment(store, entry),
                },
            ))
        })
        .collect();
    Vocabulary {
        iri: iri.to_owned(),
        name: name.to_owned(),
        profile_name: profile_name.to_owned(),
        summary: comment(store, term),
        description: None,
        entries,
    }
}

fn check_acyclic(classes: &BTreeMap<String, Arc<Class>>) -> Result<(), CompileError> {
    for start in classes.values() {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(class) = current {
            if !visited.insert(class.iri.as_str()) {
                return Err(CompileError::InheritanceCycle(class.iri.clone()));
            }
            current = class
                .sub_class_of
                .as_deref()
                .and_then(|parent| classes.get(parent));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{parse_graph, Format};

    const PREFIXES: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix core: <https://example.org/Core/> .
    "#;

    fn compile_ttl(body: &str) -> Result<Model, CompileError> {
        let store = parse_graph(&format!("{PREFIXES}{body}"), Format::Turtle).unwrap();
        compile(&store)
    }

    #[test]
    fn vocabularies_are_classes_used_as_types() {
        let model = compile_ttl(
            r#"
            core:HashAlgorithm a owl:Class .
            core:HashAlgorithm\/sha256 a owl:NamedIndividual, core:HashAlgorithm .
            core:Element a owl:Class .
            "#,
        )
        .unwrap();
        assert!(model.find_class("https://example.org/Core/Element").is_some());
        assert!(model.find_class("https://example.org/Core/HashAlgorithm").is_none());
        let vocab = model
            .find_vocabulary("https://example.org/Core/HashAlgorithm")
            .unwrap();
        assert_eq!(vocab.entries.len(), 1);
        let entry = &vocab.entries["https://example.org/Core/HashAlgorithm/sha256"];
        assert_eq!(entry.name, "sha256");
        assert_eq!(entry.profile_name, "HashAlgorithm");
    }

    #[test]
    fn shapes_are_classified() {
        let model = compile_ttl(
            r#"
            core:name a owl:DatatypeProperty ; rdfs:range xsd:string .
            core:specVersion a owl:DatatypeProperty ; rdfs:range xsd:string .
            core:creationInfo a owl:ObjectProperty ; rdfs:range core:CreationInfo .
            core:CreationInfo a owl:Class .
            core:Element a owl:Class ;
                sh:property [
                    sh:path core:name ;
                    sh:datatype xsd:string ;
                    sh:nodeKind sh:Literal ;
                    sh:maxCount 1
                ] , [
                    sh:path core:specVersion ;
                    sh:datatype xsd:string ;
                    sh:pattern "^(0|[1-9]\\d*)\\.(0|[1-9]\\d*)\\.(0|[1-9]\\d*)(?:-((?:0|[1-9]\\d*|\\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\\.(?:0|[1-9]\\d*|\\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\\+([0-9a-zA-Z-]+(?:\\.[0-9a-zA-Z-]+)*))?$" ;
                    sh:minCount 1
                ] , [
                    sh:path core:creationInfo ;
                    sh:class core:CreationInfo ;
                    sh:nodeKind sh:BlankNodeOrIRI ;
                    sh:minCount 1 ;
                    sh:maxCount 1
                ] .
            "#,
        )
        .unwrap();
        let element = model.find_class("https://example.org/Core/Element").unwrap();
        let name = &element.properties["name"];
        assert_eq!(name.datatype(), Some(LiteralType::String));
        assert_eq!(name.max_count, Some(1));
        assert_eq!(name.min_count, None);
        assert_eq!(
            element.properties["specVersion"].datatype(),
            Some(LiteralType::SemVer)
        );
        let creation_info = &element.properties["creationInfo"];
        assert_eq!(
            creation_info.target_class(),
            Some("https://example.org/Core/CreationInfo")
        );
        assert!(creation_info.is_required());
        assert_eq!(creation_info.parent_class, element.iri);
    }

    #[test]
    fn enumerations_read_sh_in_lists() {
        let model = compile_ttl(
            r#"
            core:algorithm a owl:ObjectProperty ; rdfs:range core:HashAlgorithm .
            core:HashAlgorithm a owl:Class .
            core:HashAlgorithm\/md5 a core:HashAlgorithm .
            core:HashAlgorithm\/sha1 a core:HashAlgorithm .
            core:Hash a owl:Class ;
                sh:property [
                    sh:path core:algorithm ;
                    sh:in ( core:HashAlgorithm\/md5 core:HashAlgorithm\/sha1 ) ;
                    sh:nodeKind sh:IRI
                ] .
            "#,
        )
        .unwrap();
        let hash = model.find_class("https://example.org/Core/Hash").unwrap();
        let options = hash.properties["algorithm"].options().unwrap();
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["md5", "sha1"]);
    }

    #[test]
    fn partial_shapes_are_skipped() {
        let model = compile_ttl(
            r#"
            core:known a owl:DatatypeProperty ; rdfs:range xsd:string .
            core:Element a owl:Class ;
                sh:property [ sh:minCount 1 ] ,
                    [ sh:path core:unknown ; sh:datatype xsd:string ] ,
                    [ sh:path core:known ; sh:datatype xsd:gYear ] ,
                    [ sh:path core:known ; sh:class core:Missing ] .
            "#,
        )
        .unwrap();
        let element = model.find_class("https://example.org/Core/Element").unwrap();
        assert!(element.properties.is_empty());
    }

    #[test]
    fn node_kind_is_inferred() {
        let model = compile_ttl(
            r#"
            core:name a owl:DatatypeProperty ; rdfs:range xsd:string .
            core:Element a owl:Class ;
                sh:property [ sh:path core:name ; sh:datatype xsd:anyURI ] .
            "#,
        )
        .unwrap();
        let element = model.find_class("https://example.org/Core/Element").unwrap();
        assert_eq!(element.properties["name"].node_kind(), NodeKind::Literal);
        assert_eq!(
            element.properties["name"].datatype(),
            Some(LiteralType::AnyUri)
        );
    }

    #[test]
    fn subclass_links_and_profiles() {
        let model = compile_ttl(
            r#"
            core:Element a owl:Class ; rdfs:comment "Root" .
            core:Artifact a owl:Class ; rdfs:subClassOf core:Element .
            core:Orphan a owl:Class ; rdfs:subClassOf core:Nowhere .
            "#,
        )
        .unwrap();
        let artifact = model.find_class_by_name("Core", "Artifact").unwrap();
        assert_eq!(
            artifact.sub_class_of.as_deref(),
            Some("https://example.org/Core/Element")
        );
        assert_eq!(
            model.find_class_by_name("Core", "Element").unwrap().summary.as_deref(),
            Some("Root")
        );
        assert!(model.find_class_by_name("Core", "Orphan").unwrap().sub_class_of.is_none());
    }

    #[test]
    fn cycles_fail_compilation() {
        let result = compile_ttl(
            r#"
            core:A a owl:Class ; rdfs:subClassOf core:B .
            core:B a owl:Class ; rdfs:subClassOf core:A .
            "#,
        );
        assert!(matches!(result, Err(CompileError::InheritanceCycle(_))));
    }

    #[test]
    fn ontology_info_and_individuals() {
        let model = compile_ttl(
            r#"
            <https://example.org/> a owl:Ontology ;
                owl:versionInfo "3.0.1" ;
                rdfs:comment "Example" .
            core:Agent a owl:Class .
            core:SpdxOrganization a owl:NamedIndividual ;
                rdfs:range core:Agent .
            "#,
        )
        .unwrap();
        assert_eq!(model.info.version.as_deref(), Some("3.0.1"));
        assert_eq!(model.info.iri.as_deref(), Some("https://example.org/"));
        assert_eq!(model.individual_count(), 1);
        assert!(matches!(
            model.find_item("https://example.org/Core/SpdxOrganization"),
            Some(crate::model::Item::Individual(_))
        ));
    }
}
