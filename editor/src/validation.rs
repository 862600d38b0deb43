//! Validation engine.
//!
//! Property values are checked against their class property (datatype
//! lexical rules or enumeration membership) and nodes are checked for unmet
//! required properties across their whole inheritance chain. Invalidity is
//! reported, never raised: the graph keeps invalid values so they can be
//! corrected in place, and export proceeds with a report attached.

use std::collections::HashSet;
use std::sync::Arc;

use spdx_ontology::{ClassProperty, ClassPropertyKind, PropertyValue};

use crate::catalog::OptionCatalog;
use crate::graph::{InstanceGraph, Node};

/// Returns true if `value` satisfies `cp`.
///
/// An empty entry satisfies a property without a positive `minCount`.
/// Literal properties use the datatype rule and, when the catalog holds
/// options for the path, must also be one of them. Enumerated properties
/// accept a vocabulary entry or a catalog option registered for the path.
/// Object properties never hold values.
pub fn property_valid(
    cp: &ClassProperty,
    value: Option<&PropertyValue>,
    catalog: &OptionCatalog,
) -> bool {
    if value.is_none() && !cp.is_object() && !cp.is_required() {
        return true;
    }
    match &cp.kind {
        ClassPropertyKind::Literal { datatype } => {
            datatype.validate(value)
                && (!catalog.has_options(&cp.path)
                    || value
                        .map(PropertyValue::lexical)
                        .is_some_and(|v| catalog.contains(&cp.path, &v)))
        }
        ClassPropertyKind::Enumerated { options } => match value.and_then(PropertyValue::as_text) {
            Some(v) => options.iter().any(|o| o.value == v) || catalog.contains(&cp.path, v),
            None => false,
        },
        ClassPropertyKind::Object { .. } => false,
    }
}

/// Number of entries satisfying `cp` on `node`: valid values for literal and
/// enumerated properties, outgoing edges for object properties.
pub fn satisfying_count(graph: &InstanceGraph, node: &Node, cp: &ClassProperty) -> usize {
    if cp.is_object() {
        graph.out_edge_count(&node.id, &cp.path)
    } else {
        node.node_props
            .iter()
            .filter(|p| p.valid && p.class_property.path == cp.path)
            .count()
    }
}

/// True if `cp` requires more satisfying entries than `node` has.
pub fn is_unmet(graph: &InstanceGraph, node: &Node, cp: &ClassProperty) -> bool {
    match cp.min_count {
        Some(min) if min > 0 => satisfying_count(graph, node, cp) < min as usize,
        _ => false,
    }
}

/// Required class properties of `node` (own and inherited) that are unmet.
///
/// Every declaration of the chain is checked; a path that is unmet under
/// several declarations is reported once, with the nearest unmet one.
pub fn unmet_required(graph: &InstanceGraph, node: &Node) -> Vec<Arc<ClassProperty>> {
    let mut reported = HashSet::new();
    node.rec_cls_props
        .properties()
        .filter(|cp| is_unmet(graph, node, cp))
        .filter(|cp| reported.insert(cp.path.as_str()))
        .cloned()
        .collect()
}

/// Severity level of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check identified a warning (non-blocking).
    Warning,
    /// The check failed.
    Failure,
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct Finding {
    /// Short identifier of the check that produced this finding.
    pub validator: String,
    /// Node the finding is about, if any.
    pub node: Option<String>,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Optional additional detail lines.
    pub details: Vec<String>,
}

impl Finding {
    fn new(validator: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            validator: validator.into(),
            node: None,
            message: message.into(),
            severity,
            details: Vec::new(),
        }
    }

    /// Creates a passing finding.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Pass)
    }

    /// Creates a failing finding with additional detail lines.
    pub fn fail_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            details,
            ..Self::new(validator, message, Severity::Failure)
        }
    }

    /// Creates a warning with additional detail lines.
    pub fn warn_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            details,
            ..Self::new(validator, message, Severity::Warning)
        }
    }

    /// Attaches the node this finding is about.
    #[must_use]
    pub fn for_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Returns true if this finding is a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Aggregated findings over a set of nodes.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All findings, in node order.
    pub results: Vec<Finding>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn push(&mut self, finding: Finding) {
        self.results.push(finding);
    }

    /// Extends this report with the findings of another.
    pub fn extend(&mut self, other: ValidationReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of failures.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns the count of warnings.
    pub fn warning_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no failures.
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Checks one node: every property value and every required property.
pub fn validate_node(graph: &InstanceGraph, node: &Node) -> ValidationReport {
    let mut report = ValidationReport::new();
    let label = format!("{} {}", node.cls.name, node.id);

    let invalid: Vec<String> = node
        .node_props
        .iter()
        .filter(|p| !p.valid)
        .map(|p| match &p.value {
            Some(v) => format!("{} = {:?}", p.class_property.name, v.lexical()),
            None => format!("{} has no value", p.class_property.name),
        })
        .collect();
    if invalid.is_empty() {
        report.push(Finding::pass("node/values", format!("{label}: all values valid")).for_node(&node.id));
    } else {
        report.push(
            Finding::fail_with_details(
                "node/values",
                format!("{label}: {} invalid value(s)", invalid.len()),
                invalid,
            )
            .for_node(&node.id),
        );
    }

    let empty: Vec<String> = node
        .node_props
        .iter()
        .filter(|p| p.valid && p.value.is_none())
        .map(|p| format!("{} is empty and will not be exported", p.class_property.name))
        .collect();
    if !empty.is_empty() {
        report.push(
            Finding::warn_with_details(
                "node/empty",
                format!("{label}: {} empty optional value(s)", empty.len()),
                empty,
            )
            .for_node(&node.id),
        );
    }

    let unmet: Vec<String> = unmet_required(graph, node)
        .iter()
        .map(|cp| {
            let kind = if cp.is_object() { "edge" } else { "value" };
            format!(
                "missing {kind} {} (minCount {})",
                cp.name,
                cp.min_count.unwrap_or_default()
            )
        })
        .collect();
    if unmet.is_empty() {
        report.push(
            Finding::pass("node/required", format!("{label}: required properties met"))
                .for_node(&node.id),
        );
    } else {
        report.push(
            Finding::fail_with_details(
                "node/required",
                format!("{label}: {} unmet required property(ies)", unmet.len()),
                unmet,
            )
            .for_node(&node.id),
        );
    }
    report
}

/// Checks every node of the graph.
pub fn validate_graph(graph: &InstanceGraph) -> ValidationReport {
    validate_nodes(graph, graph.nodes().iter())
}

/// Checks the given nodes.
pub fn validate_nodes<'a>(
    graph: &InstanceGraph,
    nodes: impl IntoIterator<Item = &'a Node>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    for node in nodes {
        report.extend(validate_node(graph, node));
    }
    report
}
