//! The instance graph.
//!
//! Nodes are instances of concrete ontology classes; literal and enumerated
//! values live on the node as [`NodeProperty`] entries, object-typed values
//! are [`Edge`]s to other nodes. Every mutation goes through
//! [`InstanceGraph`], which enforces the class constraints: abstract classes
//! are never instantiated, `maxCount` caps values and edges together, and an
//! edge's target must be an instance of the property's target class.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use spdx_ontology::model::parse_iri;
use spdx_ontology::{Class, ClassProperty, Model, PropertyValue, RecursiveProperties, Resolver};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::OptionCatalog;
use crate::config::EditorConfig;
use crate::error::GraphError;
use crate::validation::{self, ValidationReport};

/// Mints a fresh `urn:uuid:` identifier.
pub fn generate_urn() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Layout position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A literal or enumerated value held by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperty {
    /// Unique within the owning node.
    pub id: String,
    /// The constraint this value is checked against.
    pub class_property: Arc<ClassProperty>,
    /// Current value; `None` until one is entered.
    pub value: Option<PropertyValue>,
    /// Result of the last validation of `value`.
    pub valid: bool,
    /// True if the entry was created to satisfy a `minCount`.
    pub required: bool,
}

/// An instance of a concrete class.
#[derive(Debug, Clone)]
pub struct Node {
    /// `urn:uuid:` identifier, or the id it was imported under.
    pub id: String,
    /// Layout position.
    pub position: Position,
    /// Instantiated class.
    pub cls: Arc<Class>,
    /// Class IRIs from `cls` up to the root.
    pub inheritance_list: Vec<String>,
    /// Own and inherited class properties.
    pub rec_cls_props: Arc<RecursiveProperties>,
    /// Values, in insertion order.
    pub node_props: Vec<NodeProperty>,
    /// True if `cls` descends from the configured element class.
    pub is_element: bool,
}

impl Node {
    /// True if this node is an instance of `class_iri` (directly or by
    /// inheritance).
    pub fn is_a(&self, class_iri: &str) -> bool {
        self.inheritance_list.iter().any(|c| c == class_iri)
    }

    /// Looks up a value by id.
    pub fn property(&self, id: &str) -> Option<&NodeProperty> {
        self.node_props.iter().find(|p| p.id == id)
    }

    /// Values whose class property has the given path.
    pub fn properties_with_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a NodeProperty> {
        self.node_props
            .iter()
            .filter(move |p| p.class_property.path == path)
    }

    /// Nearest class property of this node with the given path.
    pub fn class_property(&self, path: &str) -> Option<&Arc<ClassProperty>> {
        self.rec_cls_props.find_by_path(path)
    }

    fn declares(&self, cp: &ClassProperty) -> bool {
        self.rec_cls_props.properties().any(|own| **own == *cp)
    }
}

/// A typed link between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Unique within the graph.
    pub id: String,
    /// Id of the node holding the property.
    pub source: String,
    /// Id of the referenced node.
    pub target: String,
    /// The object property this edge instantiates.
    pub class_property: Arc<ClassProperty>,
    /// Display label (the property name).
    pub label: String,
}

/// Outcome of an insertion that is subject to `maxCount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addition {
    /// The entry was created with this id.
    Added(String),
    /// The property already holds `maxCount` entries; nothing changed.
    MaxCardinalityReached,
}

impl Addition {
    /// Id of the created entry.
    pub fn id(&self) -> Option<&str> {
        match self {
            Addition::Added(id) => Some(id),
            Addition::MaxCardinalityReached => None,
        }
    }

    /// True if an entry was created.
    pub fn is_added(&self) -> bool {
        matches!(self, Addition::Added(_))
    }
}

/// Settings that shape node creation.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    /// `(profile, name)` of the class whose descendants are elements.
    pub element_class: (String, String),
    /// Overrides the ontology version prefilled into `specVersion`.
    pub spec_version: Option<String>,
    /// External option lists used during validation.
    pub catalog: OptionCatalog,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            element_class: ("Core".to_owned(), "Element".to_owned()),
            spec_version: None,
            catalog: OptionCatalog::new(),
        }
    }
}

impl GraphSettings {
    /// Derives settings from an editor configuration.
    pub fn from_config(config: &EditorConfig) -> Self {
        let (profile, name) = config.element_class_parts();
        Self {
            element_class: (profile.to_owned(), name.to_owned()),
            spec_version: config.spec_version.clone(),
            catalog: OptionCatalog::new(),
        }
    }

    fn element_iri(&self, model: &Model) -> Option<String> {
        let (profile, name) = &self.element_class;
        model
            .find_class_by_name(profile, name)
            .map(|c| c.iri.clone())
    }
}

/// Nodes and edges typed by a compiled model.
#[derive(Debug, Clone)]
pub struct InstanceGraph {
    resolver: Resolver,
    settings: GraphSettings,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl InstanceGraph {
    /// Creates an empty graph over `resolver`'s model.
    pub fn new(resolver: Resolver, settings: GraphSettings) -> Self {
        Self {
            resolver,
            settings,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// The resolver typing this graph.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The model typing this graph.
    pub fn model(&self) -> &Arc<Model> {
        self.resolver.model()
    }

    /// Current settings.
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Option catalog used by validation.
    pub fn catalog(&self) -> &OptionCatalog {
        &self.settings.catalog
    }

    /// Mutable access to the option catalog.
    ///
    /// Stored validity flags are not recomputed; call
    /// [`revalidate`](Self::revalidate) after changing the catalog.
    pub fn catalog_mut(&mut self) -> &mut OptionCatalog {
        &mut self.settings.catalog
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_owned()))
    }

    fn existing(&self, id: &str) -> Result<&Node, GraphError> {
        self.node(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_owned()))
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Instantiates `class_iri` under a fresh URN.
    ///
    /// Required literal and enumerated properties (own and inherited) are
    /// created with their default value; a `CreationInfo.specVersion` is
    /// prefilled with the configured or ontology version.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownClass`] if `class_iri` is not a class of
    /// the model and [`GraphError::AbstractClass`] if it is abstract.
    pub fn add_node(&mut self, class_iri: &str, position: Position) -> Result<String, GraphError> {
        let node = self.create_node(generate_urn(), class_iri, position)?;
        Ok(self.insert_node(node))
    }

    /// Instantiates `class_iri` under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// As [`add_node`](Self::add_node), plus [`GraphError::DuplicateNodeId`]
    /// if `id` is taken.
    pub fn add_node_with_id(
        &mut self,
        id: &str,
        class_iri: &str,
        position: Position,
    ) -> Result<String, GraphError> {
        if self.node(id).is_some() {
            return Err(GraphError::DuplicateNodeId(id.to_owned()));
        }
        let node = self.create_node(id.to_owned(), class_iri, position)?;
        Ok(self.insert_node(node))
    }

    fn insert_node(&mut self, node: Node) -> String {
        debug!(id = %node.id, class = %node.cls.name, "added node");
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    fn create_node(&self, id: String, class_iri: &str, position: Position) -> Result<Node, GraphError> {
        let model = self.resolver.model();
        let cls = model
            .find_class(class_iri)
            .cloned()
            .ok_or_else(|| GraphError::UnknownClass(class_iri.to_owned()))?;
        if cls.is_abstract {
            return Err(GraphError::AbstractClass(class_iri.to_owned()));
        }
        let rec_cls_props = self.resolver.recursive_properties(class_iri)?;
        let is_element = self
            .settings
            .element_iri(model)
            .is_some_and(|e| rec_cls_props.contains_class(&e));

        let mut seen = HashSet::new();
        let mut node_props = Vec::new();
        for cp in rec_cls_props.required() {
            if cp.is_object() || !seen.insert(cp.path.as_str()) {
                continue;
            }
            let value = self.initial_value(cp);
            node_props.push(NodeProperty {
                id: generate_id(),
                valid: validation::property_valid(cp, value.as_ref(), &self.settings.catalog),
                class_property: Arc::clone(cp),
                value,
                required: true,
            });
        }

        Ok(Node {
            id,
            position,
            inheritance_list: rec_cls_props.class_iris().map(str::to_owned).collect(),
            cls,
            node_props,
            rec_cls_props,
            is_element,
        })
    }

    fn initial_value(&self, cp: &ClassProperty) -> Option<PropertyValue> {
        if cp.name == "specVersion" && parse_iri(&cp.parent_class).0 == "CreationInfo" {
            let version = self
                .settings
                .spec_version
                .clone()
                .or_else(|| self.model().info.version.clone());
            if let Some(version) = version {
                return Some(PropertyValue::Text(version));
            }
        }
        cp.datatype().and_then(|d| d.default_value())
    }

    /// Removes a node with its incident edges.
    ///
    /// Returns false (and changes nothing) if the node does not exist.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        let edges = self.edges.len();
        self.edges.retain(|e| e.source != id && e.target != id);
        debug!(id, edges = edges - self.edges.len(), "deleted node");
        true
    }

    /// Moves a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Removes every node and edge.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Number of values plus outgoing edges of `node_id` with `path`,
    /// counting invalid values.
    pub fn entry_count(&self, node_id: &str, path: &str) -> usize {
        let values = self
            .node(node_id)
            .map_or(0, |n| n.properties_with_path(path).count());
        values + self.out_edge_count(node_id, path)
    }

    /// True if `node_id` already holds `maxCount` entries for `cp`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist.
    pub fn reached_max_count(&self, node_id: &str, cp: &ClassProperty) -> Result<bool, GraphError> {
        self.existing(node_id)?;
        Ok(cp
            .max_count
            .is_some_and(|max| self.entry_count(node_id, &cp.path) >= max as usize))
    }

    /// Adds a literal or enumerated value to a node.
    ///
    /// Without a value, booleans start as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ObjectPropertyAsValue`] for object properties,
    /// [`GraphError::UnknownNode`] if the node does not exist and
    /// [`GraphError::UnknownProperty`] if `cp` is not declared by the node's
    /// class chain.
    pub fn add_node_property(
        &mut self,
        node_id: &str,
        cp: &Arc<ClassProperty>,
        value: Option<PropertyValue>,
    ) -> Result<Addition, GraphError> {
        if cp.is_object() {
            return Err(GraphError::ObjectPropertyAsValue(cp.path.clone()));
        }
        if !self.existing(node_id)?.declares(cp) {
            return Err(GraphError::UnknownProperty {
                node: node_id.to_owned(),
                property: cp.path.clone(),
            });
        }
        if self.reached_max_count(node_id, cp)? {
            debug!(node = node_id, property = %cp.name, "max cardinality reached");
            return Ok(Addition::MaxCardinalityReached);
        }
        let value = value.or_else(|| cp.datatype().and_then(|d| d.default_value()));
        let valid = validation::property_valid(cp, value.as_ref(), &self.settings.catalog);
        let id = generate_id();
        self.node_mut(node_id)?.node_props.push(NodeProperty {
            id: id.clone(),
            class_property: Arc::clone(cp),
            value,
            valid,
            required: false,
        });
        Ok(Addition::Added(id))
    }

    /// Replaces a value and revalidates it. Returns the new validity.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist and
    /// [`GraphError::UnknownProperty`] if it has no value `prop_id`.
    pub fn set_node_property(
        &mut self,
        node_id: &str,
        prop_id: &str,
        value: Option<PropertyValue>,
    ) -> Result<bool, GraphError> {
        let Self { nodes, settings, .. } = self;
        let node = nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_owned()))?;
        let prop = node
            .node_props
            .iter_mut()
            .find(|p| p.id == prop_id)
            .ok_or_else(|| GraphError::UnknownProperty {
                node: node_id.to_owned(),
                property: prop_id.to_owned(),
            })?;
        prop.valid = validation::property_valid(&prop.class_property, value.as_ref(), &settings.catalog);
        prop.value = value;
        Ok(prop.valid)
    }

    /// Removes a value from a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist and
    /// [`GraphError::UnknownProperty`] if it has no value `prop_id`.
    pub fn delete_node_property(&mut self, node_id: &str, prop_id: &str) -> Result<NodeProperty, GraphError> {
        let node = self.node_mut(node_id)?;
        let index = node
            .node_props
            .iter()
            .position(|p| p.id == prop_id)
            .ok_or_else(|| GraphError::UnknownProperty {
                node: node_id.to_owned(),
                property: prop_id.to_owned(),
            })?;
        Ok(node.node_props.remove(index))
    }

    /// Recomputes the validity flag of every value, e.g. after the catalog
    /// changed.
    pub fn revalidate(&mut self) {
        let Self { nodes, settings, .. } = self;
        for prop in nodes.iter_mut().flat_map(|n| n.node_props.iter_mut()) {
            prop.valid =
                validation::property_valid(&prop.class_property, prop.value.as_ref(), &settings.catalog);
        }
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Links `source` to `target` through the object property `cp`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotAnObjectProperty`] if `cp` is not an object
    /// property, [`GraphError::UnknownNode`] if either node does not exist,
    /// [`GraphError::UnknownProperty`] if `cp` is not declared by the
    /// source's class chain and [`GraphError::TargetClassMismatch`] if the
    /// target is not an instance of `cp`'s target class.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        cp: &Arc<ClassProperty>,
    ) -> Result<Addition, GraphError> {
        let Some(target_class) = cp.target_class() else {
            return Err(GraphError::NotAnObjectProperty(cp.path.clone()));
        };
        let source_node = self.existing(source)?;
        let target_node = self.existing(target)?;
        if !source_node.declares(cp) {
            return Err(GraphError::UnknownProperty {
                node: source.to_owned(),
                property: cp.path.clone(),
            });
        }
        if !target_node.is_a(target_class) {
            return Err(GraphError::TargetClassMismatch {
                target: target.to_owned(),
                expected: target_class.to_owned(),
            });
        }
        if self.reached_max_count(source, cp)? {
            debug!(source, property = %cp.name, "max cardinality reached");
            return Ok(Addition::MaxCardinalityReached);
        }
        let id = generate_id();
        self.edges.push(Edge {
            id: id.clone(),
            source: source.to_owned(),
            target: target.to_owned(),
            class_property: Arc::clone(cp),
            label: cp.name.clone(),
        });
        debug!(source, target, property = %cp.name, "added edge");
        Ok(Addition::Added(id))
    }

    /// Removes an edge and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownEdge`] if no edge has this id.
    pub fn delete_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.to_owned()))?;
        let edge = self.edges.remove(index);
        debug!(id, source = %edge.source, target = %edge.target, "deleted edge");
        Ok(edge)
    }

    /// Edges leaving `node_id`.
    pub fn out_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Edges entering `node_id`.
    pub fn in_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Number of edges leaving `node_id` through `path`.
    pub fn out_edge_count(&self, node_id: &str, path: &str) -> usize {
        self.out_edges(node_id)
            .filter(|e| e.class_property.path == path)
            .count()
    }

    /// Distinct targets of the edges leaving `node_id`.
    pub fn outgoers(&self, node_id: &str) -> Vec<&Node> {
        let mut seen = HashSet::new();
        self.out_edges(node_id)
            .filter(|e| seen.insert(e.target.as_str()))
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// Distinct sources of the edges entering `node_id`.
    pub fn incomers(&self, node_id: &str) -> Vec<&Node> {
        let mut seen = HashSet::new();
        self.in_edges(node_id)
            .filter(|e| seen.insert(e.source.as_str()))
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Ids of `root` and every node reachable from it, breadth first.
    ///
    /// Empty if `root` does not exist.
    pub fn subtree(&self, root: &str) -> Vec<String> {
        if self.node(root).is_none() {
            return Vec::new();
        }
        let mut order = vec![root.to_owned()];
        let mut seen: HashSet<String> = order.iter().cloned().collect();
        let mut queue = VecDeque::from([root.to_owned()]);
        while let Some(id) = queue.pop_front() {
            for next in self.outgoers(&id) {
                if seen.insert(next.id.clone()) {
                    order.push(next.id.clone());
                    queue.push_back(next.id.clone());
                }
            }
        }
        order
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Required properties of `node_id` that are not satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist.
    pub fn unmet_required(&self, node_id: &str) -> Result<Vec<Arc<ClassProperty>>, GraphError> {
        Ok(validation::unmet_required(self, self.existing(node_id)?))
    }

    /// Validates every node.
    pub fn validate(&self) -> ValidationReport {
        validation::validate_graph(self)
    }

    // ------------------------------------------------------------------
    // Model replacement
    // ------------------------------------------------------------------

    /// Retypes the graph against a new model.
    ///
    /// Values and edges whose property is no longer declared by their node's
    /// class chain are dropped with a warning; the rest are rebound to the
    /// new class properties and revalidated. The graph is left untouched if
    /// any node's class no longer resolves.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownClass`] if a node's class is missing from
    /// the new model and [`GraphError::InheritanceCycle`] if its chain is
    /// cyclic.
    pub fn replace_model(&mut self, model: Arc<Model>) -> Result<(), GraphError> {
        let mut resolver = self.resolver.clone();
        resolver.replace_model(model);
        let element_iri = self.settings.element_iri(resolver.model());

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let cls = resolver
                .model()
                .find_class(&node.cls.iri)
                .cloned()
                .ok_or_else(|| GraphError::UnknownClass(node.cls.iri.clone()))?;
            let rec_cls_props = resolver.recursive_properties(&cls.iri)?;
            let mut node_props = Vec::with_capacity(node.node_props.len());
            for prop in &node.node_props {
                match rec_cls_props.find_by_path(&prop.class_property.path) {
                    Some(cp) if !cp.is_object() => node_props.push(NodeProperty {
                        valid: validation::property_valid(cp, prop.value.as_ref(), &self.settings.catalog),
                        class_property: Arc::clone(cp),
                        ..prop.clone()
                    }),
                    _ => warn!(
                        node = %node.id,
                        property = %prop.class_property.path,
                        "dropping value no longer declared by its class"
                    ),
                }
            }
            nodes.push(Node {
                id: node.id.clone(),
                position: node.position,
                inheritance_list: rec_cls_props.class_iris().map(str::to_owned).collect(),
                is_element: element_iri
                    .as_deref()
                    .is_some_and(|e| rec_cls_props.contains_class(e)),
                cls,
                rec_cls_props,
                node_props,
            });
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            let source = nodes.iter().find(|n| n.id == edge.source);
            let target = nodes.iter().find(|n| n.id == edge.target);
            let rebound = source
                .and_then(|s| s.class_property(&edge.class_property.path))
                .filter(|cp| {
                    cp.target_class()
                        .is_some_and(|t| target.is_some_and(|n| n.is_a(t)))
                })
                .cloned();
            match rebound {
                Some(cp) => edges.push(Edge {
                    class_property: cp,
                    ..edge.clone()
                }),
                None => warn!(
                    source = %edge.source,
                    target = %edge.target,
                    property = %edge.class_property.path,
                    "dropping edge no longer valid for its classes"
                ),
            }
        }

        self.resolver = resolver;
        self.nodes = nodes;
        self.edges = edges;
        debug!(nodes = self.nodes.len(), edges = self.edges.len(), "replaced model");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{core, expanded_licensing, graph, software};

    fn cp(g: &InstanceGraph, node: &str, path: &str) -> Arc<ClassProperty> {
        g.node(node).unwrap().class_property(path).unwrap().clone()
    }

    #[test]
    fn abstract_and_unknown_classes_are_rejected() {
        let mut g = graph();
        assert_eq!(
            g.add_node(&core("Element"), Position::default()),
            Err(GraphError::AbstractClass(core("Element")))
        );
        assert_eq!(
            g.add_node(&core("Nope"), Position::default()),
            Err(GraphError::UnknownClass(core("Nope")))
        );
        assert!(g.is_empty());
    }

    #[test]
    fn new_nodes_carry_required_values() {
        let mut g = graph();
        let id = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        assert!(id.starts_with("urn:uuid:"));
        let node = g.node(&id).unwrap();
        assert!(!node.is_element);
        let names: Vec<&str> = node
            .node_props
            .iter()
            .map(|p| p.class_property.name.as_str())
            .collect();
        assert_eq!(names, ["created", "specVersion"]);
        let spec_version_path = core("specVersion");
        let version = node.properties_with_path(&spec_version_path).next().unwrap();
        assert_eq!(version.value, Some(PropertyValue::Text("3.0.1".into())));
        assert!(version.valid);
        let created_path = core("created");
        let created = node.properties_with_path(&created_path).next().unwrap();
        assert!(!created.valid);
    }

    #[test]
    fn boolean_values_default_to_false() {
        let mut g = graph();
        let id = g.add_node(&expanded_licensing("License"), Position::default()).unwrap();
        let osi = cp(&g, &id, &expanded_licensing("isOsiApproved"));
        let added = g.add_node_property(&id, &osi, None).unwrap();
        let node = g.node(&id).unwrap();
        let prop = node.property(added.id().unwrap()).unwrap();
        assert_eq!(prop.value, Some(PropertyValue::Bool(false)));
        assert!(prop.valid);
        assert!(node.is_element);
    }

    #[test]
    fn values_respect_max_count() {
        let mut g = graph();
        let id = g.add_node(&software("Package"), Position::default()).unwrap();
        let version = cp(&g, &id, &software("packageVersion"));
        assert!(g
            .add_node_property(&id, &version, Some("1.0".into()))
            .unwrap()
            .is_added());
        assert_eq!(
            g.add_node_property(&id, &version, Some("2.0".into())).unwrap(),
            Addition::MaxCardinalityReached
        );
        assert_eq!(g.node(&id).unwrap().properties_with_path(&software("packageVersion")).count(), 1);
    }

    #[test]
    fn object_properties_are_not_values() {
        let mut g = graph();
        let id = g.add_node(&software("Package"), Position::default()).unwrap();
        let supplied = cp(&g, &id, &core("suppliedBy"));
        assert_eq!(
            g.add_node_property(&id, &supplied, Some("x".into())),
            Err(GraphError::ObjectPropertyAsValue(core("suppliedBy")))
        );
    }

    #[test]
    fn foreign_properties_are_rejected() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let package = g.add_node(&software("Package"), Position::default()).unwrap();
        let version = cp(&g, &package, &software("packageVersion"));
        assert!(matches!(
            g.add_node_property(&person, &version, Some("1".into())),
            Err(GraphError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn set_and_delete_values() {
        let mut g = graph();
        let id = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let created = g
            .node(&id)
            .unwrap()
            .properties_with_path(&core("created"))
            .next()
            .unwrap()
            .id
            .clone();
        assert!(g
            .set_node_property(&id, &created, Some("2024-03-01T12:00:00Z".into()))
            .unwrap());
        assert!(!g.set_node_property(&id, &created, Some("yesterday".into())).unwrap());
        let removed = g.delete_node_property(&id, &created).unwrap();
        assert_eq!(removed.value, Some("yesterday".into()));
        assert!(matches!(
            g.delete_node_property(&id, &created),
            Err(GraphError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn edges_check_target_class() {
        let mut g = graph();
        let package = g.add_node(&software("Package"), Position::default()).unwrap();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let supplied = cp(&g, &package, &core("suppliedBy"));

        assert_eq!(
            g.add_edge(&package, &info, &supplied),
            Err(GraphError::TargetClassMismatch {
                target: info.clone(),
                expected: core("Agent"),
            })
        );
        let added = g.add_edge(&package, &person, &supplied).unwrap();
        let edge = g.edge(added.id().unwrap()).unwrap();
        assert_eq!(edge.label, "suppliedBy");
        assert_eq!(g.outgoers(&package)[0].id, person);
        assert_eq!(g.incomers(&person)[0].id, package);
    }

    #[test]
    fn literal_properties_are_not_edges() {
        let mut g = graph();
        let package = g.add_node(&software("Package"), Position::default()).unwrap();
        let other = g.add_node(&software("Package"), Position::default()).unwrap();
        let version = cp(&g, &package, &software("packageVersion"));
        assert_eq!(
            g.add_edge(&package, &other, &version),
            Err(GraphError::NotAnObjectProperty(software("packageVersion")))
        );
    }

    #[test]
    fn edges_respect_max_count() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let a = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let b = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let creation = cp(&g, &person, &core("creationInfo"));
        assert!(g.add_edge(&person, &a, &creation).unwrap().is_added());
        assert!(g.reached_max_count(&person, &creation).unwrap());
        assert_eq!(
            g.add_edge(&person, &b, &creation).unwrap(),
            Addition::MaxCardinalityReached
        );
        assert_eq!(g.edges().len(), 1);
    }

    #[test]
    fn deleting_a_node_removes_incident_edges() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let org = g.add_node(&core("Organization"), Position::default()).unwrap();
        g.add_edge(&person, &info, &cp(&g, &person, &core("creationInfo")))
            .unwrap();
        g.add_edge(&info, &org, &cp(&g, &info, &core("createdBy")))
            .unwrap();
        assert_eq!(g.edges().len(), 2);

        assert!(g.delete_node(&info));
        assert!(g.edges().is_empty());
        assert_eq!(g.len(), 2);
        assert!(!g.delete_node(&info));
    }

    #[test]
    fn subtree_is_breadth_first() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let org = g.add_node(&core("Organization"), Position::default()).unwrap();
        let lone = g.add_node(&core("Person"), Position::default()).unwrap();
        g.add_edge(&person, &info, &cp(&g, &person, &core("creationInfo")))
            .unwrap();
        g.add_edge(&info, &org, &cp(&g, &info, &core("createdBy")))
            .unwrap();
        g.add_edge(&org, &info, &cp(&g, &org, &core("creationInfo")))
            .unwrap();

        assert_eq!(g.subtree(&person), vec![person.clone(), info.clone(), org.clone()]);
        assert_eq!(g.subtree(&lone), vec![lone]);
        assert!(g.subtree("urn:uuid:missing").is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut g = graph();
        g.add_node_with_id("urn:x", &core("Person"), Position::default())
            .unwrap();
        assert_eq!(
            g.add_node_with_id("urn:x", &core("Person"), Position::default()),
            Err(GraphError::DuplicateNodeId("urn:x".into()))
        );
    }

    #[test]
    fn unknown_nodes_are_reported() {
        let mut g = graph();
        assert_eq!(
            g.move_node("nope", Position::new(1.0, 2.0)),
            Err(GraphError::UnknownNode("nope".into()))
        );
        assert!(g.unmet_required("nope").is_err());
    }

    #[test]
    fn deleting_edges() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        let added = g
            .add_edge(&person, &info, &cp(&g, &person, &core("creationInfo")))
            .unwrap();
        let id = added.id().unwrap().to_owned();
        let edge = g.delete_edge(&id).unwrap();
        assert_eq!((edge.source.as_str(), edge.target.as_str()), (person.as_str(), info.as_str()));
        assert!(g.edges().is_empty());
        assert_eq!(g.delete_edge(&id), Err(GraphError::UnknownEdge(id.clone())));
    }

    const RELOADED: &str = r#"
@prefix core: <https://spdx.org/rdf/3.0.1/terms/Core/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

core:Element a owl:Class, sh:NodeShape ;
    sh:property [
        sh:datatype xsd:string ;
        sh:maxCount 1 ;
        sh:nodeKind sh:Literal ;
        sh:path core:comment
    ] .
core:Agent a owl:Class, sh:NodeShape ; rdfs:subClassOf core:Element .
core:Person a owl:Class, sh:NodeShape ; rdfs:subClassOf core:Agent .
core:CreationInfo a owl:Class, sh:NodeShape .
core:comment a owl:DatatypeProperty ; rdfs:range xsd:string .
"#;

    fn reloaded() -> Arc<Model> {
        let store = spdx_ontology::parse_graph(RELOADED, spdx_ontology::Format::Turtle).unwrap();
        Arc::new(spdx_ontology::compile(&store).unwrap())
    }

    #[test]
    fn model_replacement_drops_stale_entries() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        g.add_node_property(&person, &cp(&g, &person, &core("name")), Some("Jane".into()))
            .unwrap();
        g.add_node_property(&person, &cp(&g, &person, &core("comment")), Some("hi".into()))
            .unwrap();
        g.add_edge(&person, &info, &cp(&g, &person, &core("creationInfo")))
            .unwrap();

        g.replace_model(reloaded()).unwrap();

        let node = g.node(&person).unwrap();
        let paths: Vec<&str> = node
            .node_props
            .iter()
            .map(|p| p.class_property.path.as_str())
            .collect();
        assert_eq!(paths, [core("comment")]);
        assert!(g.edges().is_empty());
        assert!(g.node(&info).unwrap().node_props.is_empty());
        assert!(g.unmet_required(&person).unwrap().is_empty());
    }

    #[test]
    fn model_replacement_is_all_or_nothing() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        g.add_node(&core("Organization"), Position::default()).unwrap();
        assert_eq!(
            g.replace_model(reloaded()),
            Err(GraphError::UnknownClass(core("Organization")))
        );
        assert_eq!(g.len(), 2);
        assert!(g.node(&person).unwrap().class_property(&core("name")).is_some());
        assert!(g.model().find_class(&core("Organization")).is_some());
    }

    #[test]
    fn reset_clears_everything() {
        let mut g = graph();
        let person = g.add_node(&core("Person"), Position::default()).unwrap();
        let info = g.add_node(&core("CreationInfo"), Position::default()).unwrap();
        g.add_edge(&person, &info, &cp(&g, &person, &core("creationInfo")))
            .unwrap();
        g.reset();
        assert!(g.is_empty());
        assert!(g.edges().is_empty());
    }
}
