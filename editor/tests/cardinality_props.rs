//! Property tests: `maxCount` bounds hold under arbitrary edit sequences.

use std::sync::Arc;

use proptest::prelude::*;
use spdx_editor::{GraphSettings, InstanceGraph, Position};
use spdx_ontology::{compile, parse_graph, Format, Model, PropertyValue, Resolver};

const CORE: &str = "https://spdx.org/rdf/3.0.1/terms/Core/";

fn model() -> Arc<Model> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../ontology/tests/fixtures/spdx-mini.ttl");
    let text = std::fs::read_to_string(path).unwrap();
    Arc::new(compile(&parse_graph(&text, Format::Turtle).unwrap()).unwrap())
}

#[derive(Debug, Clone)]
enum Op {
    Name(String),
    Comment(String),
    CreationInfo,
    DeleteValue(usize),
    DeleteEdge(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Op::Name),
        "[a-z]{0,6}".prop_map(Op::Comment),
        Just(Op::CreationInfo),
        (0usize..8).prop_map(Op::DeleteValue),
        (0usize..8).prop_map(Op::DeleteEdge),
    ]
}

fn apply(graph: &mut InstanceGraph, person: &str, op: Op) {
    let cp = |graph: &InstanceGraph, name: &str| {
        graph
            .node(person)
            .unwrap()
            .class_property(&format!("{CORE}{name}"))
            .unwrap()
            .clone()
    };
    match op {
        Op::Name(v) => {
            let cp = cp(graph, "name");
            graph.add_node_property(person, &cp, Some(PropertyValue::Text(v))).unwrap();
        }
        Op::Comment(v) => {
            let cp = cp(graph, "comment");
            graph.add_node_property(person, &cp, Some(PropertyValue::Text(v))).unwrap();
        }
        Op::CreationInfo => {
            let cp = cp(graph, "creationInfo");
            let info = graph
                .add_node(&format!("{CORE}CreationInfo"), Position::default())
                .unwrap();
            graph.add_edge(person, &info, &cp).unwrap();
        }
        Op::DeleteValue(i) => {
            let props = &graph.node(person).unwrap().node_props;
            if let Some(id) = props.get(i % props.len().max(1)).map(|p| p.id.clone()) {
                graph.delete_node_property(person, &id).unwrap();
            }
        }
        Op::DeleteEdge(i) => {
            let ids: Vec<String> = graph.out_edges(person).map(|e| e.id.clone()).collect();
            if let Some(id) = ids.get(i % ids.len().max(1)) {
                graph.delete_edge(id).unwrap();
            }
        }
    }
}

proptest! {
    #[test]
    fn max_count_is_never_exceeded(ops in proptest::collection::vec(op(), 0..40)) {
        let model = model();
        let mut graph = InstanceGraph::new(Resolver::new(model), GraphSettings::default());
        let person = graph.add_node(&format!("{CORE}Person"), Position::default()).unwrap();
        for op in ops {
            apply(&mut graph, &person, op);
            for name in ["name", "comment", "creationInfo"] {
                let property = format!("{CORE}{name}");
                prop_assert!(graph.entry_count(&person, &property) <= 1);
            }
        }
    }

    #[test]
    fn deleting_a_node_leaves_no_dangling_edges(count in 1usize..6, victim in 0usize..6) {
        let mut graph = InstanceGraph::new(Resolver::new(model()), GraphSettings::default());
        let info = graph.add_node(&format!("{CORE}CreationInfo"), Position::default()).unwrap();
        let people: Vec<String> = (0..count)
            .map(|_| graph.add_node(&format!("{CORE}Person"), Position::default()).unwrap())
            .collect();
        for person in &people {
            let cp = graph
                .node(person)
                .unwrap()
                .class_property(&format!("{CORE}creationInfo"))
                .unwrap()
                .clone();
            graph.add_edge(person, &info, &cp).unwrap();
            let by = graph
                .node(&info)
                .unwrap()
                .class_property(&format!("{CORE}createdBy"))
                .unwrap()
                .clone();
            graph.add_edge(&info, person, &by).unwrap();
        }
        let removed = people[victim % count].clone();
        prop_assert!(graph.delete_node(&removed));
        prop_assert_eq!(graph.len(), count);
        prop_assert_eq!(graph.edges().len(), 2 * (count - 1));
        for edge in graph.edges() {
            prop_assert!(graph.node(&edge.source).is_some());
            prop_assert!(graph.node(&edge.target).is_some());
        }
    }
}
