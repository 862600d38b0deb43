//! In-memory triple store.
//!
//! Terms are owned strings so the store outlives the parser buffers it was
//! filled from. Triples keep insertion order; subject and object indexes make
//! the lookups used by the compiler and the document codec O(matches).

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::model::iris::{RDF_FIRST, RDF_LANG_STRING, RDF_NIL, RDF_REST, RDF_TYPE, XSD_STRING};

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// An absolute IRI.
    Iri(String),
    /// A blank node, identified by its label without the `_:` prefix.
    Blank(String),
    /// A literal.
    Literal {
        /// Lexical form.
        lexical: String,
        /// Datatype IRI (`rdf:langString` when a language tag is present).
        datatype: String,
        /// Optional language tag.
        language: Option<String>,
    },
}

impl Term {
    /// Creates an IRI term.
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Creates a blank node term. A leading `_:` is stripped.
    pub fn blank(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.strip_prefix("_:") {
            Some(stripped) => Term::Blank(stripped.to_owned()),
            None => Term::Blank(label),
        }
    }

    /// Creates a typed literal.
    pub fn literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Creates an `xsd:string` literal.
    pub fn string(lexical: impl Into<String>) -> Self {
        Term::literal(lexical, XSD_STRING)
    }

    /// Creates a language-tagged literal.
    pub fn lang_string(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: RDF_LANG_STRING.to_owned(),
            language: Some(language.into()),
        }
    }

    /// Returns the IRI if this term is one.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Returns the lexical form if this term is a literal.
    pub fn as_lexical(&self) -> Option<&str> {
        match self {
            Term::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }

    /// Returns true for blank nodes.
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// The bare value: IRI, blank label, or lexical form.
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(v) | Term::Blank(v) => v,
            Term::Literal { lexical, .. } => lexical,
        }
    }

    /// Document-level identifier: the IRI, or `_:label` for blank nodes.
    pub fn id(&self) -> String {
        match self {
            Term::Iri(iri) => iri.clone(),
            Term::Blank(label) => format!("_:{label}"),
            Term::Literal { lexical, .. } => lexical.clone(),
        }
    }
}

impl fmt::Display for Term {
    /// Formats the term in N-Triples syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal {
                lexical,
                datatype,
                language,
            } => {
                let escaped = lexical
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r");
                match language {
                    Some(lang) => write!(f, "\"{escaped}\"@{lang}"),
                    None if datatype == XSD_STRING => write!(f, "\"{escaped}\""),
                    None => write!(f, "\"{escaped}\"^^<{datatype}>"),
                }
            }
        }
    }
}

/// A single RDF statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject: an IRI or blank node.
    pub subject: Term,
    /// Predicate IRI.
    pub predicate: String,
    /// Object term.
    pub object: Term,
}

impl Triple {
    /// Creates a triple.
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// An indexed, duplicate-free set of triples.
#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    by_subject: HashMap<Term, Vec<usize>>,
    by_object: HashMap<Term, Vec<usize>>,
    subjects: Vec<Term>,
    next_blank: usize,
}

impl TripleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a triple. Returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        let index = self.triples.len();
        let subject_entry = self.by_subject.entry(triple.subject.clone()).or_default();
        if subject_entry.is_empty() {
            self.subjects.push(triple.subject.clone());
        }
        subject_entry.push(index);
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .push(index);
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Convenience for [`insert`](Self::insert).
    pub fn add(&mut self, subject: Term, predicate: &str, object: Term) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Returns true if the store holds no triples.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterates all triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Distinct subjects in first-seen order.
    pub fn subjects(&self) -> &[Term] {
        &self.subjects
    }

    /// All triples with the given subject, in insertion order.
    pub fn triples_of<'a>(&'a self, subject: &Term) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(move |&i| &self.triples[i])
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &Term,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples_of(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// First object of `(subject, predicate, ?)`.
    pub fn object<'a>(&'a self, subject: &Term, predicate: &'a str) -> Option<&'a Term> {
        self.objects(subject, predicate).next()
    }

    /// Distinct subjects of `(?, predicate, object)` in first-seen order.
    pub fn subjects_with(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        let mut seen = HashSet::new();
        self.by_object
            .get(object)
            .into_iter()
            .flatten()
            .map(|&i| &self.triples[i])
            .filter(|t| t.predicate == predicate)
            .map(|t| &t.subject)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Returns true if some subject is typed with `class` (`?s rdf:type class`).
    pub fn is_used_as_type(&self, class: &Term) -> bool {
        self.by_object
            .get(class)
            .into_iter()
            .flatten()
            .any(|&i| self.triples[i].predicate == RDF_TYPE)
    }

    /// Reads an `rdf:List` starting at `head`.
    ///
    /// Returns `None` if the chain is malformed or cyclic.
    pub fn list(&self, head: &Term) -> Option<Vec<Term>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut node = head;
        loop {
            if node.as_iri() == Some(RDF_NIL) {
                return Some(items);
            }
            if !visited.insert(node) {
                return None;
            }
            items.push(self.object(node, RDF_FIRST)?.clone());
            node = self.object(node, RDF_REST)?;
        }
    }

    /// Returns a blank node whose label is not used in this store.
    pub fn fresh_blank(&mut self) -> Term {
        loop {
            let candidate = Term::Blank(format!("b{}", self.next_blank));
            self.next_blank += 1;
            if !self.by_subject.contains_key(&candidate) && !self.by_object.contains_key(&candidate)
            {
                return candidate;
            }
        }
    }
}

impl<'a> IntoIterator for &'a TripleStore {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
