//! Shared fixtures for unit tests.

use std::sync::Arc;

use spdx_ontology::{compile, parse_graph, Format, Model, ModelMetadata, Resolver};

use crate::graph::{GraphSettings, InstanceGraph};

const ONTOLOGY: &str = include_str!("../../ontology/tests/fixtures/spdx-mini.ttl");
const METADATA: &str = include_str!("../../ontology/tests/fixtures/model.json");

const TERMS: &str = "https://spdx.org/rdf/3.0.1/terms/";

pub fn core(name: &str) -> String {
    format!("{TERMS}Core/{name}")
}

pub fn software(name: &str) -> String {
    format!("{TERMS}Software/{name}")
}

pub fn expanded_licensing(name: &str) -> String {
    format!("{TERMS}ExpandedLicensing/{name}")
}

pub fn model() -> Arc<Model> {
    let store = parse_graph(ONTOLOGY, Format::Turtle).unwrap();
    let mut model = compile(&store).unwrap();
    model.enrich(&ModelMetadata::from_json_str(METADATA).unwrap());
    Arc::new(model)
}

pub fn graph() -> InstanceGraph {
    InstanceGraph::new(Resolver::new(model()), GraphSettings::default())
}
