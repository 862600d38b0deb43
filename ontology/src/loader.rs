//! RDF graph loading.
//!
//! Sources are read asynchronously (file system or HTTP) and then parsed
//! synchronously into a [`TripleStore`]. The format is chosen from the file
//! extension (or, for URLs without one, the `Content-Type` header), never by
//! sniffing the content.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use sophia_api::parser::QuadParser;
use sophia_api::quad::Quad;
use sophia_api::source::{QuadSource, TripleSource};
use sophia_api::term::{Term as _, TermKind};
use sophia_api::triple::Triple as _;
use sophia_iri::Iri;
use sophia_jsonld::loader::{ClosureLoader, FutureExt};
use sophia_jsonld::{JsonLdOptions, JsonLdParser};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::store::{Term, Triple, TripleStore};

/// An RDF serialization accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Turtle (`.ttl`).
    Turtle,
    /// JSON-LD (`.jsonld`, `.json-ld`).
    JsonLd,
}

impl Format {
    /// Selects a format from a file name, path or URL.
    ///
    /// Query strings and fragments are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnsupportedFormat`] for any other extension.
    pub fn from_name(name: &str) -> Result<Self, LoadError> {
        let path = name.split(['?', '#']).next().unwrap_or(name);
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let extension = file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "ttl" => Ok(Format::Turtle),
            "jsonld" | "json-ld" => Ok(Format::JsonLd),
            _ => Err(LoadError::UnsupportedFormat(name.to_owned())),
        }
    }

    /// Selects a format from an HTTP `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "text/turtle" => Some(Format::Turtle),
            "application/ld+json" => Some(Format::JsonLd),
            _ => None,
        }
    }
}

/// Where an RDF document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local file.
    Path(PathBuf),
    /// An `http(s)` URL.
    Url(String),
    /// In-memory content; `name` carries the extension.
    Content {
        /// File name used to pick the format.
        name: String,
        /// Document text.
        text: String,
    },
}

impl Source {
    /// Interprets a command-line argument as a URL or a path.
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Url(arg.to_owned())
        } else {
            Source::Path(PathBuf::from(arg))
        }
    }

    /// Human-readable name of the source.
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Url(url) => url.clone(),
            Source::Content { name, .. } => name.clone(),
        }
    }
}

/// Reads and parses `source` into a triple store.
///
/// # Errors
///
/// Returns [`LoadError::UnsupportedFormat`] when no format can be selected,
/// [`LoadError::Io`] or [`LoadError::Fetch`] when the bytes cannot be read,
/// and [`LoadError::GraphParse`] when the document is malformed. No store is
/// returned on failure.
pub async fn load_graph(source: &Source) -> Result<TripleStore, LoadError> {
    let store = match source {
        Source::Path(path) => {
            let format = Format::from_name(&path.to_string_lossy())?;
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            parse_source(&text, format).await?
        }
        Source::Url(url) => {
            let (text, format) = fetch(url).await?;
            parse_source(&text, format).await?
        }
        Source::Content { name, text } => parse_source(text, Format::from_name(name)?).await?,
    };
    info!(
        source = %source.name(),
        triples = store.len(),
        "loaded ontology graph"
    );
    Ok(store)
}

async fn fetch(url: &str) -> Result<(String, Format), LoadError> {
    let fetch_error = |e: reqwest::Error| LoadError::Fetch {
        url: url.to_owned(),
        message: e.to_string(),
    };
    let response = reqwest::get(url)
        .await
        .map_err(fetch_error)?
        .error_for_status()
        .map_err(fetch_error)?;
    let format = match Format::from_name(url) {
        Ok(format) => format,
        Err(unsupported) => response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(Format::from_content_type)
            .ok_or(unsupported)?,
    };
    debug!(url, ?format, "fetched ontology source");
    let text = response.text().await.map_err(fetch_error)?;
    Ok((text, format))
}

async fn parse_source(text: &str, format: Format) -> Result<TripleStore, LoadError> {
    match format {
        Format::Turtle => parse_graph(text, format),
        Format::JsonLd => parse_jsonld(text, &HashMap::new()).await,
    }
}

/// Parses a JSON-LD document, serving remote documents from memory.
///
/// `documents` maps a URL to the JSON text returned when the processor
/// dereferences it, typically the `@context` of the document. Any other URL
/// fails the parse. Graph names are ignored.
///
/// # Errors
///
/// Returns [`LoadError::GraphParse`] when the document is not valid JSON-LD
/// or references a document missing from `documents`.
pub async fn parse_jsonld(
    text: &str,
    documents: &HashMap<String, String>,
) -> Result<TripleStore, LoadError> {
    let documents = Arc::new(documents.clone());
    let options = JsonLdOptions::new().with_document_loader_closure(move || {
        let documents = Arc::clone(&documents);
        ClosureLoader::new(move |url: Iri<String>| {
            let document = documents
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| format!("no document is available for {}", url.as_str()));
            async move { document }.boxed()
        })
    });
    let mut store = TripleStore::new();
    JsonLdParser::new_with_options(options)
        .async_parse_str(text)
        .await
        .for_each_quad(|q| {
            push(&mut store, convert(q.s()), convert(q.p()), convert(q.o()));
        })
        .map_err(|e| LoadError::GraphParse(e.to_string()))?;
    debug!(triples = store.len(), "expanded JSON-LD document");
    Ok(store)
}

/// Parses an RDF document held in memory.
///
/// For JSON-LD, graph names are ignored and all quads are merged into the
/// default graph. JSON-LD parsing runs its own executor, so from async code
/// use [`parse_jsonld`] instead.
///
/// # Errors
///
/// Returns [`LoadError::GraphParse`] when the parser rejects the document.
pub fn parse_graph(text: &str, format: Format) -> Result<TripleStore, LoadError> {
    let mut store = TripleStore::new();
    match format {
        Format::Turtle => sophia_turtle::parser::turtle::parse_str(text)
            .for_each_triple(|t| {
                push(&mut store, convert(t.s()), convert(t.p()), convert(t.o()));
            })
            .map_err(|e| LoadError::GraphParse(e.to_string()))?,
        Format::JsonLd => sophia_jsonld::JsonLdParser::new()
            .parse_str(text)
            .for_each_quad(|q| {
                push(&mut store, convert(q.s()), convert(q.p()), convert(q.o()));
            })
            .map_err(|e| LoadError::GraphParse(e.to_string()))?,
    }
    Ok(store)
}

fn push(store: &mut TripleStore, s: Option<Term>, p: Option<Term>, o: Option<Term>) {
    if let (Some(s), Some(Term::Iri(p)), Some(o)) = (s, p, o) {
        store.insert(Triple::new(s, p, o));
    }
}

fn convert<T: sophia_api::term::Term>(term: T) -> Option<Term> {
    match term.kind() {
        TermKind::Iri => term.iri().map(|iri| Term::Iri(iri.as_str().to_owned())),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| Term::Blank(id.as_str().to_owned())),
        TermKind::Literal => {
            let lexical = String::from(&*term.lexical_form()?);
            match term.language_tag() {
                Some(tag) => Some(Term::lang_string(lexical, tag.as_str())),
                None => {
                    let datatype = term.datatype()?;
                    Some(Term::literal(lexical, datatype.as_str()))
                }
            }
        }
        _ => None,
    }
}
