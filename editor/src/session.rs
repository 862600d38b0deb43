//! Editor session: one model, one context, one instance graph.
//!
//! The session owns everything an editing front end needs and is the only
//! place where I/O meets the synchronous graph operations. Sources are read
//! and documents expanded asynchronously; every graph mutation is
//! synchronous.

use std::path::Path;
use std::sync::Arc;

use spdx_ontology::{compile, load_graph, LiteralType, Model, ModelMetadata, Resolver, Source};
use tracing::info;

use crate::catalog::OptionCatalog;
use crate::codec::{self, ExportedDocument, ImportSummary};
use crate::config::EditorConfig;
use crate::context::TermContext;
use crate::error::{ImportError, SessionError};
use crate::graph::{GraphSettings, InstanceGraph, Position};

/// Loads, compiles, enriches and checks an ontology.
///
/// # Errors
///
/// Returns [`SessionError::Load`] if the source cannot be read,
/// [`SessionError::Compile`] if it cannot be compiled,
/// [`SessionError::Metadata`] if the metadata document is unreadable and
/// [`SessionError::Resolve`] if some class hierarchy does not resolve.
pub async fn load_model(ontology: &Source, metadata: Option<&Path>) -> Result<Arc<Model>, SessionError> {
    let store = load_graph(ontology).await?;
    let mut model = compile(&store)?;
    if let Some(path) = metadata {
        model.enrich(&ModelMetadata::from_path(path).await?);
    }
    let model = Arc::new(model);
    let classes = Resolver::new(Arc::clone(&model)).warm()?;
    info!(source = %ontology.name(), classes, "ontology ready");
    Ok(model)
}

/// An editing session over one ontology.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    context: TermContext,
    graph: InstanceGraph,
}

impl EditorSession {
    /// Creates a session with an empty graph over `model`.
    ///
    /// The JSON-LD context is read from `config.context_source` when set,
    /// otherwise derived from the model.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Context`] if the configured context cannot be
    /// loaded.
    pub async fn new(config: EditorConfig, model: Arc<Model>) -> Result<Self, SessionError> {
        let context = match &config.context_source {
            Some(source) => TermContext::load(source).await?,
            None => TermContext::from_model(&model),
        };
        let graph = InstanceGraph::new(Resolver::new(model), GraphSettings::from_config(&config));
        Ok(Self {
            config,
            context,
            graph,
        })
    }

    /// Loads an ontology and creates a session over it.
    ///
    /// # Errors
    ///
    /// The errors of [`load_model`] and [`new`](Self::new).
    pub async fn open(
        config: EditorConfig,
        ontology: &Source,
        metadata: Option<&Path>,
    ) -> Result<Self, SessionError> {
        let model = load_model(ontology, metadata).await?;
        Self::new(config, model).await
    }

    /// The configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The term context used for import and export.
    pub fn context(&self) -> &TermContext {
        &self.context
    }

    /// The current model.
    pub fn model(&self) -> &Arc<Model> {
        self.graph.model()
    }

    /// The instance graph.
    pub fn graph(&self) -> &InstanceGraph {
        &self.graph
    }

    /// Mutable access to the instance graph.
    pub fn graph_mut(&mut self) -> &mut InstanceGraph {
        &mut self.graph
    }

    /// Replaces the ontology while keeping the graph.
    ///
    /// A derived context is re-derived from the new model. On error the
    /// session keeps its previous model and graph.
    ///
    /// # Errors
    ///
    /// The errors of [`load_model`], plus [`SessionError::Graph`] if a node's
    /// class is missing from the new model.
    pub async fn reload(&mut self, ontology: &Source, metadata: Option<&Path>) -> Result<(), SessionError> {
        let model = load_model(ontology, metadata).await?;
        self.replace_model(model)
    }

    /// Retypes the graph against `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Graph`] if a node's class is missing from
    /// `model`; the session is unchanged in that case.
    pub fn replace_model(&mut self, model: Arc<Model>) -> Result<(), SessionError> {
        self.graph.replace_model(Arc::clone(&model))?;
        if self.config.context_source.is_none() {
            self.context = TermContext::from_model(&model);
        }
        Ok(())
    }

    /// Registers external options for every literal property typed
    /// `MediaType` and revalidates the graph. From then on such values must
    /// be one of the registered media types.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Catalog`] if the CSV is malformed.
    pub fn load_media_types<R: std::io::Read>(&mut self, reader: R) -> Result<usize, SessionError> {
        let options = OptionCatalog::read_media_types(reader)?;
        let paths: Vec<String> = self
            .model()
            .classes()
            .flat_map(|c| c.properties.values())
            .filter(|cp| cp.datatype() == Some(LiteralType::MediaType))
            .map(|cp| cp.path.clone())
            .collect();
        let catalog = self.graph.catalog_mut();
        for path in &paths {
            catalog.extend(path.clone(), options.iter().cloned());
        }
        self.graph.revalidate();
        Ok(options.len())
    }

    /// Imports a document held in memory.
    ///
    /// # Errors
    ///
    /// The errors of [`codec::import_document`].
    pub async fn import_str(&mut self, text: &str, reference: Position) -> Result<ImportSummary, ImportError> {
        codec::import_document(&mut self.graph, &self.context, &self.config, text, reference).await
    }

    /// Reads and imports a document file.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Load`] if the file cannot be read, and the
    /// errors of [`codec::import_document`].
    pub async fn import_path(&mut self, path: &Path, reference: Position) -> Result<ImportSummary, ImportError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| spdx_ontology::LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.import_str(&text, reference).await
    }

    /// Exports every node.
    pub fn export(&self) -> ExportedDocument {
        codec::export_document(&self.graph, &self.context, &self.config)
    }

    /// Exports `root` and every node reachable from it.
    pub fn export_subtree(&self, root: &str) -> ExportedDocument {
        let ids = self.graph.subtree(root);
        let nodes = ids.iter().filter_map(|id| self.graph.node(id));
        codec::export_nodes(&self.graph, &self.context, &self.config, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{core, model, software};

    async fn session() -> EditorSession {
        EditorSession::new(EditorConfig::default(), model()).await.unwrap()
    }

    #[tokio::test]
    async fn sessions_derive_a_context_without_a_source() {
        let session = session().await;
        assert_eq!(session.context().id_key(), "spdxId");
        assert!(session.graph().is_empty());
    }

    #[tokio::test]
    async fn media_type_catalogs_narrow_validation() {
        let mut session = session().await;
        let package = session
            .graph_mut()
            .add_node(&software("Package"), Position::default())
            .unwrap();
        let cp = session
            .graph()
            .node(&package)
            .unwrap()
            .class_property(&software("contentType"))
            .unwrap()
            .clone();
        let graph = session.graph_mut();
        graph.add_node_property(&package, &cp, Some("text/plain".into())).unwrap();

        let other = graph.add_node(&software("Package"), Position::default()).unwrap();
        graph.add_node_property(&other, &cp, Some("foo/bar".into())).unwrap();
        let validity = |session: &EditorSession, id: &str| -> Vec<bool> {
            let node = session.graph().node(id).unwrap();
            node.properties_with_path(&cp.path).map(|p| p.valid).collect()
        };
        assert_eq!(validity(&session, &other), [true]);

        let csv = "Name,Template,Reference\nplain,text/plain,[RFC2046]\n";
        assert_eq!(session.load_media_types(csv.as_bytes()).unwrap(), 1);
        assert_eq!(session.graph().catalog().options_for(&cp).len(), 1);
        assert_eq!(validity(&session, &package), [true]);
        assert_eq!(validity(&session, &other), [false]);
    }

    #[tokio::test]
    async fn subtree_exports_follow_edges() {
        let mut session = session().await;
        let graph = session.graph_mut();
        let person = graph.add_node(&core("Person"), Position::default()).unwrap();
        let info = graph.add_node(&core("CreationInfo"), Position::default()).unwrap();
        graph.add_node(&core("Organization"), Position::default()).unwrap();
        let cp = graph
            .node(&person)
            .unwrap()
            .class_property(&core("creationInfo"))
            .unwrap()
            .clone();
        graph.add_edge(&person, &info, &cp).unwrap();

        let exported = session.export_subtree(&person);
        assert_eq!(exported.document["@graph"].as_array().unwrap().len(), 2);
        assert_eq!(session.export().document["@graph"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_model_replacement_keeps_the_session() {
        let mut session = session().await;
        session
            .graph_mut()
            .add_node(&core("Person"), Position::default())
            .unwrap();
        let empty = Arc::new(Model::default());
        assert!(matches!(
            session.replace_model(empty),
            Err(SessionError::Graph(_))
        ));
        assert_eq!(session.graph().len(), 1);
        assert!(session.model().class_count() > 0);
    }

    #[tokio::test]
    async fn documents_import_from_files() {
        let mut session = session().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.jsonld");
        std::fs::write(
            &path,
            format!(
                r#"{{ "@context": "{}", "@graph": [ {{ "spdxId": "urn:p", "type": "Person" }} ] }}"#,
                session.config().context_url
            ),
        )
        .unwrap();
        let summary = session.import_path(&path, Position::default()).await.unwrap();
        assert_eq!(summary.root.as_deref(), Some("urn:p"));

        let missing = session
            .import_path(&dir.path().join("missing.jsonld"), Position::default())
            .await;
        assert!(matches!(missing, Err(ImportError::Load(_))));
    }
}
