//! Document assistant. Processes batches of documents into tools and
//! answers questions over them.
//!
//! Processing is single-writer: batches are serialized by a mutex and
//! publish a fresh [`Catalog`] snapshot when done. Questions clone the
//! current snapshot and never wait on processing.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use docrouter_config::AppConfig;
use docrouter_core::document::{DocumentId, DocumentSource, TextExtractor};
use docrouter_core::error::{ChunkingError, ExtractionError, IndexBuildError};
use docrouter_core::event::{DomainEvent, EventBus};
use docrouter_core::settings::Settings;
use docrouter_core::tool::Tool;
use docrouter_index::ToolRegistryIndex;
use docrouter_ingest::{PlainTextExtractor, chunk_document};
use docrouter_tools::ToolFactory;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::loop_runner::{AgentConfig, AgentLoop};
use crate::registry::{DocumentEntry, DocumentRegistry, fingerprint};
use crate::turn::AgentTurn;

/// Why one document in a batch was not processed.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Document name must not be blank")]
    BlankName,

    #[error("Document '{0}' appears more than once in this batch")]
    DuplicateInBatch(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Chunking failed: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Index build failed: {0}")]
    Index(#[from] IndexBuildError),

    #[error("Tool name '{name}' is already registered by document '{owner}'")]
    ToolNameTaken { name: String, owner: String },
}

#[derive(Debug)]
pub struct ProcessedDocument {
    pub doc_id: DocumentId,
    pub segments: usize,
    pub tools: Vec<String>,
    /// An earlier version of this document was replaced.
    pub replaced: bool,
    /// Why the document has no summary tool, if it has none.
    pub summary_error: Option<IndexBuildError>,
}

#[derive(Debug)]
pub struct FailedDocument {
    pub name: String,
    pub error: ProcessingError,
}

/// Outcome of one batch, in input order.
#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub processed: Vec<ProcessedDocument>,
    pub failed: Vec<FailedDocument>,
}

impl ProcessingReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A consistent view of processed documents and their tool index.
#[derive(Debug)]
pub struct Catalog {
    pub documents: DocumentRegistry,
    pub tools: Arc<ToolRegistryIndex>,
}

pub struct DocumentAssistant {
    settings: Settings,
    factory: ToolFactory,
    extractor: Arc<dyn TextExtractor>,
    max_segment_size: usize,
    agent_config: AgentConfig,
    catalog: RwLock<Arc<Catalog>>,
    writer: Mutex<()>,
    event_bus: Arc<EventBus>,
}

impl DocumentAssistant {
    pub fn new(settings: Settings, event_bus: Arc<EventBus>) -> Self {
        let catalog = Catalog {
            documents: DocumentRegistry::new(),
            tools: Arc::new(ToolRegistryIndex::empty(settings.embedder.clone())),
        };
        Self {
            factory: ToolFactory::new(settings.clone()),
            settings,
            extractor: Arc::new(PlainTextExtractor::new()),
            max_segment_size: 1024,
            agent_config: AgentConfig::default(),
            catalog: RwLock::new(Arc::new(catalog)),
            writer: Mutex::new(()),
            event_bus,
        }
    }

    /// An assistant using every tunable from `config`.
    pub fn from_config(config: &AppConfig, settings: Settings, event_bus: Arc<EventBus>) -> Self {
        let factory = ToolFactory::new(settings.clone())
            .with_segment_top_k(config.retrieval.segment_top_k)
            .with_fan_in(config.summary.fan_in)
            .with_max_concurrency(config.summary.max_concurrency)
            .with_embed_batch_size(config.embedding.batch_size);

        Self::new(settings, event_bus)
            .with_factory(factory)
            .with_agent_config(AgentConfig::from_app(config))
            .with_max_segment_size(config.chunking.max_segment_size)
    }

    pub fn with_factory(mut self, factory: ToolFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_agent_config(mut self, config: AgentConfig) -> Self {
        self.agent_config = config;
        self
    }

    pub fn with_max_segment_size(mut self, size: usize) -> Self {
        self.max_segment_size = size;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The current snapshot.
    pub async fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().await.clone()
    }

    /// Turn a batch of documents into tools and register them.
    ///
    /// Failures are isolated per document. A name already registered by an
    /// earlier batch is replaced; a name repeated within this batch keeps
    /// its first occurrence.
    pub async fn process_documents(&self, sources: Vec<DocumentSource>) -> ProcessingReport {
        let _writer = self.writer.lock().await;
        let current = self.catalog().await;

        let mut report = ProcessingReport::default();
        let mut seen: HashSet<DocumentId> = HashSet::new();
        let mut built: Vec<DocumentEntry> = Vec::new();

        for source in sources {
            let outcome = match DocumentId::new(&source.name) {
                None => Err(ProcessingError::BlankName),
                Some(doc_id) if !seen.insert(doc_id.clone()) => {
                    Err(ProcessingError::DuplicateInBatch(doc_id.to_string()))
                }
                Some(doc_id) => self.process_one(doc_id, &source.path).await,
            };

            match outcome {
                Ok(entry) => built.push(entry),
                Err(error) => self.record_failure(&mut report, source.name, error),
            }
        }

        let mut owners = tool_owners(&current.documents);
        let built: Vec<DocumentEntry> = built
            .into_iter()
            .filter_map(|entry| match claim_tool_names(&mut owners, &entry.doc_id, entry.tool_names()) {
                Ok(()) => Some(entry),
                Err(error) => {
                    self.record_failure(&mut report, entry.doc_id.to_string(), error);
                    None
                }
            })
            .collect();

        if built.is_empty() {
            return report;
        }

        let (tools, built) = self.register_tools(&current, built, &mut report).await;
        match tools {
            Some(tools) => self.commit(report, current.documents.clone(), tools, built).await,
            None => report,
        }
    }

    /// Rebuild the tool index with every document in `built`.
    ///
    /// One rebuild covers the whole batch. When it fails, documents are
    /// registered one at a time so only the ones that fail are dropped.
    async fn register_tools(
        &self,
        current: &Catalog,
        built: Vec<DocumentEntry>,
        report: &mut ProcessingReport,
    ) -> (Option<ToolRegistryIndex>, Vec<DocumentEntry>) {
        let removed = replaced_tool_names(&current.documents, &built);
        let error = match current.tools.rebuild(&removed, tools_of(&built)).await {
            Ok(tools) => return (Some(tools), built),
            Err(e) => e,
        };
        warn!(
            error = %error,
            documents = built.len(),
            "Batch registry rebuild failed, registering documents one at a time"
        );

        let mut tools: Option<ToolRegistryIndex> = None;
        let mut kept = Vec::with_capacity(built.len());
        for entry in built {
            let single = std::slice::from_ref(&entry);
            let base = tools.as_ref().unwrap_or(current.tools.as_ref());
            let rebuilt = base
                .rebuild(&replaced_tool_names(&current.documents, single), tools_of(single))
                .await;
            match rebuilt {
                Ok(next) => {
                    tools = Some(next);
                    kept.push(entry);
                }
                Err(e) => self.record_failure(report, entry.doc_id.to_string(), e.into()),
            }
        }
        (tools, kept)
    }

    /// Register `built` and publish the new snapshot.
    async fn commit(
        &self,
        mut report: ProcessingReport,
        mut documents: DocumentRegistry,
        tools: ToolRegistryIndex,
        built: Vec<DocumentEntry>,
    ) -> ProcessingReport {
        for entry in built {
            let processed = ProcessedDocument {
                doc_id: entry.doc_id.clone(),
                segments: entry.segment_count,
                tools: entry.tool_names(),
                replaced: false,
                summary_error: entry.tools.summary_error.clone(),
            };
            let replaced = documents.insert(entry).is_some();

            info!(
                doc_id = %processed.doc_id,
                segments = processed.segments,
                replaced,
                "Document registered"
            );
            self.event_bus.publish(DomainEvent::DocumentProcessed {
                doc_id: processed.doc_id.to_string(),
                segments: processed.segments,
                tools: processed.tools.clone(),
                replaced,
                timestamp: Utc::now(),
            });
            report.processed.push(ProcessedDocument { replaced, ..processed });
        }

        *self.catalog.write().await = Arc::new(Catalog {
            documents,
            tools: Arc::new(tools),
        });
        report
    }

    async fn process_one(&self, doc_id: DocumentId, path: &Path) -> Result<DocumentEntry, ProcessingError> {
        let document = self.extractor.extract(path).await?;
        if document.is_blank() {
            warn!(doc_id = %doc_id, path = %path.display(), "Document has no text");
        }

        let segments = chunk_document(&document, &doc_id, self.max_segment_size)?;
        let tools = self.factory.make_tools(doc_id.clone(), segments).await?;

        Ok(DocumentEntry {
            doc_id,
            source: path.to_path_buf(),
            fingerprint: fingerprint(&document.full_text()),
            segment_count: tools.segment_count,
            tools: Arc::new(tools),
            processed_at: Utc::now(),
        })
    }

    fn record_failure(&self, report: &mut ProcessingReport, name: String, error: ProcessingError) {
        warn!(doc_id = %name, error = %error, "Document failed to process");
        self.event_bus.publish(DomainEvent::DocumentFailed {
            doc_id: name.clone(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
        report.failed.push(FailedDocument { name, error });
    }

    /// Answer a question with the current snapshot's tools.
    pub async fn ask(&self, query: &str) -> AgentTurn {
        let catalog = self.catalog().await;
        AgentLoop::new(self.settings.clone(), catalog.tools.clone(), self.event_bus.clone())
            .with_config(self.agent_config.clone())
            .run(query)
            .await
    }

    /// The tools a question would be offered, best first.
    pub async fn retrieve_tools(&self, query: &str) -> Result<Vec<String>, IndexBuildError> {
        let catalog = self.catalog().await;
        let tools = catalog
            .tools
            .retrieve(query, self.agent_config.tool_top_k)
            .await?;
        Ok(tools.iter().map(|t| t.name().to_string()).collect())
    }

    /// Registered documents in name order.
    pub async fn documents(&self) -> Vec<DocumentEntry> {
        self.catalog().await.documents.iter().cloned().collect()
    }

    /// Every registered tool name, sorted.
    pub async fn tool_names(&self) -> Vec<String> {
        self.catalog().await.tools.names()
    }
}

/// Registered tool names and the document that owns each.
fn tool_owners(documents: &DocumentRegistry) -> HashMap<String, DocumentId> {
    documents
        .iter()
        .flat_map(|entry| {
            entry
                .tool_names()
                .into_iter()
                .map(move |name| (name, entry.doc_id.clone()))
        })
        .collect()
}

/// Give `names` to `doc_id`, releasing the names it held before.
///
/// Fails without changing `owners` when another document holds one of them.
fn claim_tool_names(
    owners: &mut HashMap<String, DocumentId>,
    doc_id: &DocumentId,
    names: Vec<String>,
) -> Result<(), ProcessingError> {
    for name in &names {
        if let Some(owner) = owners.get(name).filter(|owner| *owner != doc_id) {
            return Err(ProcessingError::ToolNameTaken {
                name: name.clone(),
                owner: owner.to_string(),
            });
        }
    }
    owners.retain(|_, owner| *owner != *doc_id);
    owners.extend(names.into_iter().map(|name| (name, doc_id.clone())));
    Ok(())
}

/// Tool names of the registered versions of documents in `built`.
fn replaced_tool_names(documents: &DocumentRegistry, built: &[DocumentEntry]) -> Vec<String> {
    built
        .iter()
        .filter_map(|entry| documents.get(&entry.doc_id))
        .flat_map(|old| old.tool_names())
        .collect()
}

fn tools_of(built: &[DocumentEntry]) -> Vec<Arc<dyn Tool>> {
    built.iter().flat_map(|entry| entry.tools.tools()).collect()
}
