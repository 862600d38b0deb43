//! SPDX JSON-LD document serializer and deserializer.
//!
//! Export builds an RDF graph from the instance graph (Element nodes keep
//! their URN as subject, every other node becomes a blank node) and compacts
//! it with a [`TermContext`] into
//! `{"@context": <url>, "@graph": [...], "dots": {...}}`. The `dots` map
//! stores each node's position relative to the first exported node, in grid
//! units.
//!
//! Import checks the `@context`, expands the document into triples with the
//! `sophia_jsonld` processor, and rebuilds nodes, values and edges on a
//! staged copy of the graph that replaces the original only if every step
//! succeeds.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};
use spdx_ontology::model::iris::{RDF_TYPE, XSD_BOOLEAN, XSD_STRING};
use spdx_ontology::{ClassPropertyKind, LiteralType, LoadError, PropertyValue, Term, TripleStore};
use tracing::{info, warn};

use crate::config::EditorConfig;
use crate::context::{Coercion, TermContext, TermDefinition};
use crate::error::{GraphError, ImportError};
use crate::graph::{generate_urn, Addition, InstanceGraph, Node, NodeProperty, Position};
use crate::validation::{self, ValidationReport};

/// Result of an export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// The compacted JSON-LD document.
    pub document: Value,
    /// The RDF graph the document was compacted from.
    pub store: TripleStore,
    /// Validation findings for the exported nodes.
    pub report: ValidationReport,
}

impl ExportedDocument {
    /// Pretty-printed JSON text of the document.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; not expected for documents built by
    /// [`export_document`].
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Ids of the created nodes, in document order.
    pub node_ids: Vec<String>,
    /// The document node, else the first created node.
    pub root: Option<String>,
    /// Values and edges dropped because their property was full.
    pub dropped: usize,
}

// ======================================================================
// Export
// ======================================================================

/// Serializes every node of `graph`.
pub fn export_document(
    graph: &InstanceGraph,
    context: &TermContext,
    config: &EditorConfig,
) -> ExportedDocument {
    export_nodes(graph, context, config, graph.nodes().iter())
}

/// Serializes the given nodes; edges to nodes outside the set are dropped.
///
/// The output is an RDF graph, so parallel edges with the same property and
/// target, and repeated equal values, become a single triple.
pub fn export_nodes<'a>(
    graph: &InstanceGraph,
    context: &TermContext,
    config: &EditorConfig,
    nodes: impl IntoIterator<Item = &'a Node>,
) -> ExportedDocument {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let mut store = TripleStore::new();

    let mut subjects: HashMap<&str, Term> = HashMap::new();
    for node in &nodes {
        let subject = if node.is_element {
            Term::iri(node.id.clone())
        } else {
            store.fresh_blank()
        };
        subjects.insert(node.id.as_str(), subject);
    }

    let mut order = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let Some(subject) = subjects.get(node.id.as_str()) else {
            continue;
        };
        store.add(subject.clone(), RDF_TYPE, Term::iri(node.cls.iri.clone()));
        for prop in &node.node_props {
            let Some(value) = &prop.value else {
                continue;
            };
            let cp = &prop.class_property;
            let object = match &cp.kind {
                ClassPropertyKind::Literal { datatype } => {
                    Term::literal(value.lexical(), datatype.xsd_iri())
                }
                ClassPropertyKind::Enumerated { .. } => Term::iri(value.lexical()),
                ClassPropertyKind::Object { .. } => continue,
            };
            store.add(subject.clone(), &cp.path, object);
        }
        for edge in graph.out_edges(&node.id) {
            if let Some(target) = subjects.get(edge.target.as_str()) {
                store.add(subject.clone(), &edge.class_property.path, target.clone());
            }
        }
        order.push((*node, subject.clone()));
    }

    let graph_items: Vec<Value> = order
        .iter()
        .map(|(_, subject)| compact_subject(&store, context, subject))
        .collect();

    let mut dots = Map::new();
    if let Some((origin, _)) = order.first() {
        let [gx, gy] = config.grid;
        for (node, subject) in &order {
            dots.insert(
                subject.id(),
                json!({
                    "x": (node.position.x - origin.position.x) / gx,
                    "y": (node.position.y - origin.position.y) / gy,
                }),
            );
        }
    }

    let report = validation::validate_nodes(graph, nodes.iter().copied());
    info!(
        nodes = order.len(),
        triples = store.len(),
        failures = report.failure_count(),
        "exported document"
    );
    ExportedDocument {
        document: json!({
            "@context": config.context_url,
            "@graph": graph_items,
            "dots": dots,
        }),
        store,
        report,
    }
}

fn compact_subject(store: &TripleStore, context: &TermContext, subject: &Term) -> Value {
    let mut object = Map::new();
    match subject {
        Term::Blank(_) => object.insert("@id".to_owned(), json!(subject.id())),
        _ => object.insert(context.id_key().to_owned(), json!(subject.id())),
    };

    let mut types = Vec::new();
    let mut properties: Vec<(String, Vec<Value>)> = Vec::new();
    for triple in store.triples_of(subject) {
        if triple.predicate == RDF_TYPE {
            if let Some(iri) = triple.object.as_iri() {
                types.push(json!(context.compact_iri(iri)));
            }
            continue;
        }
        let (key, definition) = match context.term_for(&triple.predicate) {
            Some((term, def)) => (term.to_owned(), Some(def)),
            None => (context.compact_iri(&triple.predicate), None),
        };
        let value = compact_value(context, definition, &triple.object);
        match properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => properties.push((key, vec![value])),
        }
    }

    let types = match types.len() {
        1 => types.remove(0),
        _ => Value::Array(types),
    };
    object.insert(context.type_key().to_owned(), types);
    for (key, mut values) in properties {
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(key, value);
    }
    Value::Object(object)
}

fn compact_value(context: &TermContext, definition: Option<&TermDefinition>, term: &Term) -> Value {
    let coercion = definition.and_then(|d| d.coercion.as_ref());
    match term {
        Term::Iri(iri) => match (coercion, definition) {
            (Some(Coercion::Id), _) => json!(iri),
            (Some(Coercion::Vocab), Some(def)) => json!(context.compact_vocab_value(def, iri)),
            _ => json!({ "@id": iri }),
        },
        Term::Blank(_) => match coercion {
            Some(Coercion::Id) => json!(term.id()),
            _ => json!({ "@id": term.id() }),
        },
        Term::Literal {
            lexical,
            datatype,
            language,
        } => {
            if let Some(language) = language {
                return json!({ "@value": lexical, "@language": language });
            }
            if datatype == XSD_BOOLEAN {
                if let Ok(b) = lexical.parse::<bool>() {
                    return Value::Bool(b);
                }
            }
            match coercion {
                Some(Coercion::Datatype(dt)) if dt == datatype => json!(lexical),
                None if datatype == XSD_STRING => json!(lexical),
                _ => json!({ "@value": lexical, "@type": context.compact_iri(datatype) }),
            }
        }
    }
}

// ======================================================================
// Import
// ======================================================================

/// Imports a document into `graph`.
///
/// The document is expanded by a JSON-LD processor that resolves the
/// configured context URL to `context`. Nodes are positioned at `reference`
/// plus their `dots` offset (scaled by the grid), or at `reference` when the
/// document has no position for them. On error the graph is left unchanged.
///
/// # Errors
///
/// Returns [`ImportError::ContextMismatch`] if the document's `@context` is
/// not exactly the configured context URL, [`ImportError::GraphParse`] if it
/// is not valid JSON-LD, [`ImportError::DuplicateNodeId`] if one of its URN
/// subjects already is a node, [`ImportError::MissingType`],
/// [`ImportError::UnknownProperty`] and [`ImportError::MissingTarget`] for
/// entries that do not fit the model, and [`ImportError::Graph`] if a node
/// cannot be created.
pub async fn import_document(
    graph: &mut InstanceGraph,
    context: &TermContext,
    config: &EditorConfig,
    text: &str,
    reference: Position,
) -> Result<ImportSummary, ImportError> {
    let mut document: Value =
        serde_json::from_str(text).map_err(|e| ImportError::GraphParse(e.to_string()))?;
    check_context(&document, config)?;
    let dots = match document.as_object_mut().and_then(|d| d.remove("dots")) {
        Some(Value::Object(dots)) => dots,
        _ => Map::new(),
    };
    let order = top_level_subjects(&document, context);
    skolemize(&mut document, context, false);

    let documents = HashMap::from([(config.context_url.clone(), context.document().to_string())]);
    let expanded = spdx_ontology::parse_jsonld(&document.to_string(), &documents)
        .await
        .map_err(|e| match e {
            LoadError::GraphParse(message) => ImportError::GraphParse(message),
            other => ImportError::Load(other),
        })?;
    let (store, origins) = restore_blanks(&expanded);

    let mut seen = HashSet::new();
    let subjects: Vec<&Term> = order
        .iter()
        .filter(|t| store.triples_of(t).next().is_some())
        .chain(store.subjects())
        .filter(|t| seen.insert(*t))
        .collect();
    for subject in &subjects {
        if let Term::Iri(iri) = subject {
            if graph.node(iri).is_some() {
                return Err(ImportError::DuplicateNodeId(iri.clone()));
            }
        }
    }

    let [gx, gy] = config.grid;
    let mut staged = graph.clone();
    let mut ids: HashMap<&Term, String> = HashMap::new();
    let mut node_ids = Vec::with_capacity(subjects.len());
    let mut placeholders = HashSet::new();

    for subject in &subjects {
        let document_id = origins.get(*subject).cloned().unwrap_or_else(|| subject.id());
        let class_iri = store
            .objects(subject, RDF_TYPE)
            .filter_map(Term::as_iri)
            .find(|iri| staged.model().find_class(iri).is_some())
            .or_else(|| store.object(subject, RDF_TYPE).and_then(Term::as_iri))
            .ok_or_else(|| ImportError::MissingType(document_id.clone()))?;
        let position = dots.get(&document_id).map_or(reference, |offset| Position {
            x: offset.get("x").and_then(Value::as_f64).unwrap_or_default() * gx + reference.x,
            y: offset.get("y").and_then(Value::as_f64).unwrap_or_default() * gy + reference.y,
        });
        let id = match subject {
            Term::Iri(iri) => iri.clone(),
            _ => generate_urn(),
        };
        staged.add_node_with_id(&id, class_iri, position)?;
        if let Some(node) = staged.node(&id) {
            placeholders.extend(node.node_props.iter().map(|p| p.id.clone()));
        }
        ids.insert(*subject, id.clone());
        node_ids.push(id);
    }

    let mut dropped = 0usize;
    for subject in &subjects {
        let Some(node_id) = ids.get(*subject) else {
            continue;
        };
        for triple in store.triples_of(subject) {
            if triple.predicate == RDF_TYPE {
                continue;
            }
            let node = staged
                .node(node_id)
                .ok_or_else(|| ImportError::Graph(GraphError::UnknownNode(node_id.clone())))?;
            let cp = node
                .class_property(&triple.predicate)
                .cloned()
                .ok_or_else(|| ImportError::UnknownProperty {
                    class: node.cls.iri.clone(),
                    path: triple.predicate.clone(),
                })?;

            let addition = match &cp.kind {
                ClassPropertyKind::Object { .. } => {
                    let target = ids.get(&triple.object).ok_or_else(|| {
                        ImportError::MissingTarget(
                            origins
                                .get(&triple.object)
                                .cloned()
                                .unwrap_or_else(|| triple.object.id()),
                        )
                    })?;
                    staged.add_edge(node_id, target, &cp)?
                }
                kind => {
                    let value = match kind {
                        ClassPropertyKind::Literal { datatype } => {
                            literal_value(*datatype, &triple.object)
                        }
                        _ => PropertyValue::Text(triple.object.value().to_owned()),
                    };
                    // Entries prefilled at creation are filled once, preferring
                    // one that already holds the value.
                    let open: Vec<&NodeProperty> = node
                        .properties_with_path(&cp.path)
                        .filter(|p| placeholders.contains(&p.id))
                        .collect();
                    let placeholder = open
                        .iter()
                        .find(|p| p.value.as_ref() == Some(&value))
                        .or_else(|| open.first())
                        .map(|p| p.id.clone());
                    match placeholder {
                        Some(prop_id) => {
                            placeholders.remove(&prop_id);
                            staged.set_node_property(node_id, &prop_id, Some(value))?;
                            Addition::Added(prop_id)
                        }
                        None => staged.add_node_property(node_id, &cp, Some(value))?,
                    }
                }
            };
            if addition == Addition::MaxCardinalityReached {
                warn!(
                    node = %node_id,
                    property = %cp.name,
                    "dropping imported entry: max cardinality reached"
                );
                dropped += 1;
            }
        }
    }

    let root = node_ids
        .iter()
        .find(|id| {
            staged
                .node(id)
                .is_some_and(|n| n.cls.name == config.document_class)
        })
        .or_else(|| node_ids.first())
        .cloned();

    *graph = staged;
    info!(nodes = node_ids.len(), dropped, "imported document");
    Ok(ImportSummary {
        node_ids,
        root,
        dropped,
    })
}

fn check_context(document: &Value, config: &EditorConfig) -> Result<(), ImportError> {
    match document.get("@context") {
        Some(Value::String(url)) if *url == config.context_url => Ok(()),
        _ => Err(ImportError::ContextMismatch {
            expected: config.context_url.clone(),
        }),
    }
}

/// Prefix of the IRIs standing in for document blank node labels while the
/// processor runs, which would otherwise relabel them.
const SKOLEM_PREFIX: &str = "urn:x-spdx-editor:blank:";

/// Subjects of the top-level node objects, in document order.
fn top_level_subjects(document: &Value, context: &TermContext) -> Vec<Term> {
    let items: Vec<&Value> = match document.get("@graph") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
        None => vec![document],
    };
    items
        .into_iter()
        .filter_map(Value::as_object)
        .filter_map(|object| {
            object
                .iter()
                .find(|(k, _)| context.is_id_key(k))
                .and_then(|(_, v)| v.as_str())
        })
        .map(|id| match id.strip_prefix("_:") {
            Some(label) => Term::Blank(format!("d{label}")),
            None => Term::iri(context.expand_iri(id)),
        })
        .collect()
}

/// Rewrites blank node labels in identifier positions to skolem IRIs.
fn skolemize(value: &mut Value, context: &TermContext, identifies: bool) {
    match value {
        Value::String(s) if identifies => {
            if let Some(label) = s.strip_prefix("_:") {
                let skolem = format!("{SKOLEM_PREFIX}{label}");
                *s = skolem;
            }
        }
        Value::Array(items) => {
            for item in items {
                skolemize(item, context, identifies);
            }
        }
        Value::Object(object) => {
            for (key, item) in object.iter_mut() {
                if key == "@context" || key == "@value" || context.is_type_key(key) {
                    continue;
                }
                let identifies = context.is_id_key(key)
                    || context
                        .term(key)
                        .is_some_and(|def| def.coercion == Some(Coercion::Id));
                skolemize(item, context, identifies);
            }
        }
        _ => {}
    }
}

/// Turns skolem IRIs back into blank nodes and keeps the label each one had
/// in the document. Labels minted by the processor get their own namespace.
fn restore_blanks(expanded: &TripleStore) -> (TripleStore, HashMap<Term, String>) {
    let mut store = TripleStore::new();
    let mut origins = HashMap::new();
    let mut restore = |term: &Term| match term {
        Term::Iri(iri) => match iri.strip_prefix(SKOLEM_PREFIX) {
            Some(label) => {
                let blank = Term::Blank(format!("d{label}"));
                origins
                    .entry(blank.clone())
                    .or_insert_with(|| format!("_:{label}"));
                blank
            }
            None => term.clone(),
        },
        Term::Blank(label) => Term::Blank(format!("g{label}")),
        Term::Literal { .. } => term.clone(),
    };
    for triple in expanded.iter() {
        let subject = restore(&triple.subject);
        let object = restore(&triple.object);
        store.add(subject, &triple.predicate, object);
    }
    (store, origins)
}

fn literal_value(datatype: LiteralType, object: &Term) -> PropertyValue {
    let numeric = matches!(
        datatype,
        LiteralType::Decimal | LiteralType::NonNegativeInteger | LiteralType::PositiveInteger
    );
    match object {
        Term::Literal {
            lexical,
            datatype: dt,
            ..
        } if dt == XSD_BOOLEAN && datatype != LiteralType::Boolean => {
            PropertyValue::Text(lexical.clone())
        }
        // JSON numbers with a fraction arrive in canonical double form.
        Term::Literal { lexical, .. } if numeric && lexical.contains(['E', 'e']) => {
            match lexical.parse::<f64>() {
                Ok(n) => PropertyValue::Number(n),
                Err(_) => PropertyValue::Text(lexical.clone()),
            }
        }
        _ => datatype.value_from_lexical(object.value()),
    }
}
