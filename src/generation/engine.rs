//! RAG query engine
//!
//! Retrieve, build the augmented prompt, and generate with an ordered chain
//! of LLM providers. The chain is exhausted before an error surfaces, so a
//! flaky primary model degrades to its fallbacks instead of failing queries.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{LlmConfig, RetrievalConfig};
use crate::embedding::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::generation::prompt::{ContextBlock, PromptBuilder};
use crate::providers::{GenerationParams, LlmProvider, VectorMatch};
use crate::retrieval::VectorIndex;
use crate::types::{Message, SourceDocument};

/// A generated answer with its cited sources
#[derive(Debug, Clone)]
pub struct Answer {
    pub content: String,
    /// Sources in retrieval rank order
    pub sources: Vec<SourceDocument>,
}

/// Retrieval-augmented generation engine
pub struct RagEngine {
    gateway: Arc<EmbeddingGateway>,
    index: Arc<VectorIndex>,
    chain: Vec<Arc<dyn LlmProvider>>,
    prompt: PromptBuilder,
    params: GenerationParams,
    generation_timeout: Duration,
    default_top_k: usize,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("chain_len", &self.chain.len())
            .field("params", &self.params)
            .field("generation_timeout", &self.generation_timeout)
            .field("default_top_k", &self.default_top_k)
            .finish_non_exhaustive()
    }
}

impl RagEngine {
    /// Build an engine with `chain` tried in order for every query
    pub fn new(
        gateway: Arc<EmbeddingGateway>,
        index: Arc<VectorIndex>,
        chain: Vec<Arc<dyn LlmProvider>>,
        llm: &LlmConfig,
        retrieval: &RetrievalConfig,
    ) -> Result<Self> {
        if chain.is_empty() {
            return Err(Error::Config("LLM chain must not be empty".to_string()));
        }
        Ok(Self {
            gateway,
            index,
            chain,
            prompt: PromptBuilder::for_template(&llm.prompt_template),
            params: GenerationParams {
                temperature: llm.temperature,
                max_tokens: llm.max_tokens,
            },
            generation_timeout: Duration::from_secs(llm.timeout_secs),
            default_top_k: retrieval.top_k,
        })
    }

    /// Answer a question using the indexed documents
    ///
    /// `document_scope` restricts retrieval; `history` provides conversational
    /// context but is never searched.
    pub async fn answer(
        &self,
        question: &str,
        history: &[Message],
        document_scope: Option<&[Uuid]>,
        top_k: Option<usize>,
    ) -> Result<Answer> {
        let top_k = top_k.unwrap_or(self.default_top_k);

        let embedding = self.gateway.embed_query(question).await?;
        let matches = self.index.search(&embedding, document_scope, top_k).await?;
        tracing::debug!("Retrieved {} chunks for query", matches.len());

        let context: Vec<ContextBlock> = matches
            .iter()
            .map(|m| ContextBlock {
                title: m.record.title().to_string(),
                text: m.record.text_preview().to_string(),
            })
            .collect();

        let sources = Self::sources_from(&matches);
        let prompt = self.prompt.render(question, &context, history);
        let content = self.generate(&prompt).await?;

        Ok(Answer { content, sources })
    }

    /// Try each provider in order, returning the first successful completion
    ///
    /// Every call is bounded: a hanging provider counts as a failure and the
    /// chain moves on instead of stalling the query.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;

        for provider in &self.chain {
            let attempt = tokio::time::timeout(
                self.generation_timeout,
                provider.generate(prompt, &self.params),
            )
            .await
            .unwrap_or_else(|_| {
                Err(Error::Timeout(format!("generation via {}", provider.model())))
            });

            match attempt {
                Ok(content) => {
                    tracing::debug!("Model {} answered", provider.model());
                    return Ok(content);
                }
                Err(e) => {
                    tracing::warn!("Model {} failed: {}, trying next", provider.model(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("no LLM provider configured")))
    }

    fn sources_from(matches: &[VectorMatch]) -> Vec<SourceDocument> {
        matches
            .iter()
            .filter_map(|m| {
                let document_id = m.record.document_id()?;
                Some(SourceDocument {
                    document_id,
                    title: m.record.title().to_string(),
                    content_excerpt: m.record.text_preview().to_string(),
                    relevance_score: m.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::providers::{EmbeddingProvider, MemoryVectorIndex};
    use crate::types::{Chunk, VectorRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
        fn dimensions(&self) -> usize {
            2
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct ScriptedLlm {
        fail: bool,
        calls: AtomicUsize,
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::llm("scripted outage"))
            } else {
                Ok(self.reply.to_string())
            }
        }
        fn name(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    async fn engine_with_chain(chain: Vec<Arc<dyn LlmProvider>>) -> (RagEngine, Uuid) {
        let gateway = Arc::new(EmbeddingGateway::new(
            Arc::new(FixedEmbedder),
            &EmbeddingConfig {
                dimensions: 2,
                ..Default::default()
            },
        ));
        let index = Arc::new(VectorIndex::new(
            Arc::new(MemoryVectorIndex::new()),
            &RetrievalConfig::default(),
            2,
        ));

        let document_id = Uuid::new_v4();
        let chunk = Chunk {
            document_id,
            index: 0,
            text: "quantum computing basics".to_string(),
            char_start: 0,
            char_end: 24,
        };
        index
            .upsert(&[VectorRecord::from_chunk(&chunk, vec![1.0, 0.0], "q.txt")])
            .await
            .unwrap();

        let engine = RagEngine::new(
            gateway,
            index,
            chain,
            &LlmConfig::default(),
            &RetrievalConfig::default(),
        )
        .unwrap();
        (engine, document_id)
    }

    #[tokio::test]
    async fn answers_with_rank_ordered_sources() {
        let chain: Vec<Arc<dyn LlmProvider>> = vec![Arc::new(ScriptedLlm {
            fail: false,
            calls: AtomicUsize::new(0),
            reply: "an answer",
        })];
        let (engine, document_id) = engine_with_chain(chain).await;

        let answer = engine.answer("what is quantum?", &[], None, None).await.unwrap();
        assert_eq!(answer.content, "an answer");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].document_id, document_id);
        assert!(answer.sources[0].relevance_score > 0.9);
    }

    #[tokio::test]
    async fn falls_back_to_next_model() {
        let primary = Arc::new(ScriptedLlm {
            fail: true,
            calls: AtomicUsize::new(0),
            reply: "",
        });
        let fallback = Arc::new(ScriptedLlm {
            fail: false,
            calls: AtomicUsize::new(0),
            reply: "fallback answer",
        });
        let chain: Vec<Arc<dyn LlmProvider>> = vec![primary.clone(), fallback.clone()];
        let (engine, _) = engine_with_chain(chain).await;

        let answer = engine.answer("question", &[], None, None).await.unwrap();
        assert_eq!(answer.content, "fallback answer");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    struct HangingLlm;

    #[async_trait]
    impl LlmProvider for HangingLlm {
        async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
        fn name(&self) -> &str {
            "hanging"
        }
        fn model(&self) -> &str {
            "hanging-model"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_model_times_out_and_falls_back() {
        let fallback = Arc::new(ScriptedLlm {
            fail: false,
            calls: AtomicUsize::new(0),
            reply: "fallback answer",
        });
        let chain: Vec<Arc<dyn LlmProvider>> = vec![Arc::new(HangingLlm), fallback.clone()];
        let (engine, _) = engine_with_chain(chain).await;

        let answer = engine.answer("question", &[], None, None).await.unwrap();
        assert_eq!(answer.content, "fallback answer");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn chain_of_hangs_surfaces_timeout() {
        let chain: Vec<Arc<dyn LlmProvider>> = vec![Arc::new(HangingLlm)];
        let (engine, _) = engine_with_chain(chain).await;

        let err = engine.answer("question", &[], None, None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn exhausted_chain_surfaces_error() {
        let chain: Vec<Arc<dyn LlmProvider>> = vec![
            Arc::new(ScriptedLlm {
                fail: true,
                calls: AtomicUsize::new(0),
                reply: "",
            }),
            Arc::new(ScriptedLlm {
                fail: true,
                calls: AtomicUsize::new(0),
                reply: "",
            }),
        ];
        let (engine, _) = engine_with_chain(chain).await;

        let err = engine.answer("question", &[], None, None).await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }

    #[tokio::test]
    async fn empty_chain_is_a_config_error() {
        let gateway = Arc::new(EmbeddingGateway::new(
            Arc::new(FixedEmbedder),
            &EmbeddingConfig {
                dimensions: 2,
                ..Default::default()
            },
        ));
        let index = Arc::new(VectorIndex::new(
            Arc::new(MemoryVectorIndex::new()),
            &RetrievalConfig::default(),
            2,
        ));
        let err = RagEngine::new(
            gateway,
            index,
            Vec::new(),
            &LlmConfig::default(),
            &RetrievalConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
