//! Application context
//!
//! Owns every long-lived component and wires them together at startup.
//! Handlers and background tasks share it through an `Arc` instead of
//! globals.

use std::sync::Arc;

use crate::chat::{ChatService, SessionStore};
use crate::config::RagConfig;
use crate::embedding::EmbeddingGateway;
use crate::error::Result;
use crate::generation::RagEngine;
use crate::ingestion::{Chunker, IngestionPipeline};
use crate::processing::{CleanupSweeper, WorkerPool};
use crate::providers::{
    EmbeddingProvider, LlmProvider, MemoryVectorIndex, OllamaEmbedder, OllamaLlm,
    PlainTextExtractor, TextExtractor, VectorIndexProvider,
};
use crate::retrieval::VectorIndex;
use crate::storage::{DocumentRegistry, FileStore};

/// Pluggable external collaborators for [`AppContext::with_providers`]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm_chain: Vec<Arc<dyn LlmProvider>>,
    pub vector_index: Arc<dyn VectorIndexProvider>,
    pub extractor: Arc<dyn TextExtractor>,
}

/// Shared application state
pub struct AppContext {
    pub config: RagConfig,
    pub registry: Arc<DocumentRegistry>,
    pub files: Arc<FileStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<RagEngine>,
    pub chat: ChatService,
    pub workers: WorkerPool,
    pub sweeper: Arc<CleanupSweeper>,
}

impl AppContext {
    /// Initialize with the default providers: Ollama for embeddings and
    /// generation, the in-memory vector index, and plain-text extraction
    pub async fn init(config: RagConfig) -> Result<Arc<Self>> {
        let embedder = Arc::new(OllamaEmbedder::new(&config.llm, &config.embedding)?);

        let mut llm_chain: Vec<Arc<dyn LlmProvider>> =
            vec![Arc::new(OllamaLlm::new(&config.llm)?)];
        for model in &config.llm.fallback_models {
            llm_chain.push(Arc::new(OllamaLlm::with_model(&config.llm, model.clone())?));
        }

        let providers = Providers {
            embedder,
            llm_chain,
            vector_index: Arc::new(MemoryVectorIndex::new()),
            extractor: Arc::new(PlainTextExtractor),
        };
        Self::with_providers(config, providers).await
    }

    /// Initialize with explicit providers (tests, alternative backends)
    pub async fn with_providers(config: RagConfig, providers: Providers) -> Result<Arc<Self>> {
        config.validate()?;

        let files = Arc::new(FileStore::new(config.storage.upload_dir.clone()));
        files.init().await?;

        let registry = Arc::new(DocumentRegistry::load(&config.storage.documents_path).await?);
        let sessions = Arc::new(SessionStore::load(&config.storage.sessions_path).await?);

        let gateway = Arc::new(EmbeddingGateway::new(providers.embedder, &config.embedding));
        let index = Arc::new(VectorIndex::new(
            providers.vector_index,
            &config.retrieval,
            config.embedding.dimensions,
        ));

        let pipeline = Arc::new(IngestionPipeline::new(
            registry.clone(),
            files.clone(),
            Chunker::new(&config.chunking),
            gateway.clone(),
            index.clone(),
            providers.extractor,
            config.upload.clone(),
            &config.processing,
        ));

        let engine = Arc::new(RagEngine::new(
            gateway,
            index,
            providers.llm_chain,
            &config.llm,
            &config.retrieval,
        )?);

        let chat = ChatService::new(engine.clone(), sessions);
        let workers = WorkerPool::start(pipeline.clone(), &config.processing);
        let sweeper = Arc::new(CleanupSweeper::new(
            pipeline.clone(),
            registry.clone(),
            config.cleanup.clone(),
        ));
        sweeper.start();

        tracing::info!(
            "Application context initialized ({} documents on record)",
            registry.len()
        );

        Ok(Arc::new(Self {
            config,
            registry,
            files,
            pipeline,
            engine,
            chat,
            workers,
            sweeper,
        }))
    }

    /// Stop background tasks, draining in-flight ingestion jobs
    pub async fn shutdown(&self) {
        self.sweeper.stop().await;
        self.workers.stop().await;
        tracing::info!("Application context shut down");
    }
}
