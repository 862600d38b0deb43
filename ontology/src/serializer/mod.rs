//! RDF writers for triple stores.
//!
//! Only N-Triples ([`ntriples`]) is provided: one absolute triple per line,
//! suitable for diffing and bulk loading. Documents exchanged with the editor
//! use compacted JSON-LD, which lives with the document codec.

pub mod ntriples;

pub use ntriples::to_ntriples;
