//! N-Triples serializer.
//!
//! Produces a valid N-Triples document (one triple per line, absolute IRIs,
//! `_:` labels for blank nodes). Triples are written in store order.

use crate::store::{Triple, TripleStore};

/// Serializes every triple of `store` to an N-Triples string.
#[must_use]
pub fn to_ntriples(store: &TripleStore) -> String {
    let mut out = String::with_capacity(store.len() * 96);
    for t in store {
        triple(&mut out, t);
    }
    out
}

fn triple(out: &mut String, t: &Triple) {
    out.push_str(&t.subject.to_string());
    out.push_str(" <");
    out.push_str(&t.predicate);
    out.push_str("> ");
    out.push_str(&t.object.to_string());
    out.push_str(" .\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{parse_graph, Format};
    use crate::model::iris::{OWL_CLASS, RDFS_COMMENT, RDF_TYPE};
    use crate::store::Term;

    fn sample() -> TripleStore {
        let mut store = TripleStore::new();
        let element = Term::iri("https://example.org/Core/Element");
        store.add(element.clone(), RDF_TYPE, Term::iri(OWL_CLASS));
        store.add(element, RDFS_COMMENT, Term::string("multi\nline \"quoted\""));
        store.add(
            Term::blank("b0"),
            RDF_TYPE,
            Term::iri("https://example.org/Core/CreationInfo"),
        );
        store
    }

    #[test]
    fn every_line_ends_with_period() {
        let nt = to_ntriples(&sample());
        assert_eq!(nt.lines().count(), 3);
        for line in nt.lines() {
            assert!(line.ends_with(" ."), "Line does not end with ' .': {line}");
        }
    }

    #[test]
    fn contains_owl_class_declarations() {
        let nt = to_ntriples(&sample());
        assert!(nt.contains(&format!("<{}>", OWL_CLASS)));
        assert!(nt.starts_with("<https://example.org/Core/Element> "));
        assert!(nt.contains("_:b0 <"));
    }

    #[test]
    fn output_reparses_as_turtle() {
        let nt = to_ntriples(&sample());
        let reparsed = parse_graph(&nt, Format::Turtle).unwrap();
        assert_eq!(reparsed.len(), 3);
        let element = Term::iri("https://example.org/Core/Element");
        assert_eq!(
            reparsed.object(&element, RDFS_COMMENT),
            Some(&Term::string("multi\nline \"quoted\""))
        );
    }
}
