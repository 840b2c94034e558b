//! Shared test harness: deterministic provider doubles and a wired context

#![allow(dead_code)]

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use doc_rag::config::RagConfig;
use doc_rag::context::Providers;
use doc_rag::error::{Error, Result};
use doc_rag::providers::{
    EmbeddingProvider, GenerationParams, LlmProvider, MemoryVectorIndex, PlainTextExtractor,
};
use doc_rag::AppContext;

pub const DIMENSIONS: usize = 8;

static TRACING: std::sync::Once = std::sync::Once::new();

/// Install a test-writer subscriber once per process; `RUST_LOG` controls it
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Gate that can hold embedding calls open until a test releases them
pub struct EmbedGate {
    tx: tokio::sync::watch::Sender<bool>,
}

impl EmbedGate {
    pub fn new() -> Self {
        let (tx, _) = tokio::sync::watch::channel(false);
        Self { tx }
    }

    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn open(&self) {
        self.tx.send_replace(false);
    }

    async fn wait_open(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if !*rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Embedder producing a stable vector from a hash of the text
pub struct MockEmbedder {
    pub fail: Arc<AtomicBool>,
    pub gate: Arc<EmbedGate>,
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.gate.wait_open().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("mock embedder offline"));
        }
        let digest = Sha256::digest(text.as_bytes());
        Ok(digest
            .iter()
            .take(DIMENSIONS)
            .map(|b| *b as f32 / 255.0)
            .collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "mock-embedder"
    }
}

/// LLM double with a switchable failure mode, recording every prompt
pub struct MockLlm {
    pub fail: Arc<AtomicBool>,
    pub reply: String,
    pub prompts: Arc<parking_lot::Mutex<Vec<String>>>,
    model: String,
}

impl MockLlm {
    pub fn new(model: &str, reply: &str, fail: Arc<AtomicBool>) -> Self {
        Self {
            fail,
            reply: reply.to_string(),
            prompts: Arc::new(parking_lot::Mutex::new(Vec::new())),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::llm("mock model offline"))
        } else {
            Ok(self.reply.clone())
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// A fully wired context over temp storage and mock providers
pub struct Harness {
    pub ctx: Arc<AppContext>,
    pub embed_fail: Arc<AtomicBool>,
    pub embed_gate: Arc<EmbedGate>,
    pub llm_fail: Arc<AtomicBool>,
    pub fallback_fail: Arc<AtomicBool>,
    pub prompts: Arc<parking_lot::Mutex<Vec<String>>>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_workers(2).await
    }

    pub async fn with_workers(workers: usize) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();

        let mut config = RagConfig::default();
        config.storage.upload_dir = dir.path().join("uploads");
        config.storage.documents_path = dir.path().join("documents.json");
        config.storage.sessions_path = dir.path().join("sessions.json");
        config.embedding.dimensions = DIMENSIONS;
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 20;
        config.processing.workers = workers;

        let embed_fail = Arc::new(AtomicBool::new(false));
        let embed_gate = Arc::new(EmbedGate::new());
        let llm_fail = Arc::new(AtomicBool::new(false));
        let fallback_fail = Arc::new(AtomicBool::new(false));

        let primary = MockLlm::new("mock-primary", "primary answer", llm_fail.clone());
        let prompts = primary.prompts.clone();
        let fallback = MockLlm::new("mock-fallback", "fallback answer", fallback_fail.clone());

        let providers = Providers {
            embedder: Arc::new(MockEmbedder {
                fail: embed_fail.clone(),
                gate: embed_gate.clone(),
            }),
            llm_chain: vec![Arc::new(primary), Arc::new(fallback)],
            vector_index: Arc::new(MemoryVectorIndex::new()),
            extractor: Arc::new(PlainTextExtractor),
        };

        let ctx = AppContext::with_providers(config, providers).await.unwrap();

        Self {
            ctx,
            embed_fail,
            embed_gate,
            llm_fail,
            fallback_fail,
            prompts,
            _dir: dir,
        }
    }

    /// Upload and fully ingest a text document
    pub async fn ingest_text(&self, filename: &str, text: &str) -> doc_rag::Document {
        let doc = self
            .ctx
            .pipeline
            .create_document(filename, text.as_bytes())
            .await
            .unwrap();
        self.ctx.pipeline.ingest(doc.id).await.unwrap()
    }
}
