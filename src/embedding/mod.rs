//! Embedding gateway
//!
//! Wraps an [`EmbeddingProvider`] with bounded parallelism, batching, and a
//! per-call timeout. Batch embedding is all-or-nothing and order-preserving:
//! output index i is always the embedding of input i.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Gateway in front of the embedding provider
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    semaphore: Arc<Semaphore>,
    batch_size: usize,
    timeout: Duration,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(config.max_parallel.max(1))),
            batch_size: config.batch_size.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Embedding dimensions of the underlying provider
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed a single query string
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text).await
    }

    /// Embed a batch of texts, preserving input order
    ///
    /// Any individual failure fails the whole batch; callers never see a
    /// partially embedded result.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let futures = batch.iter().map(|text| self.embed_one(text));
            let batch_embeddings = try_join_all(futures).await?;
            embeddings.extend(batch_embeddings);
        }

        Ok(embeddings)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| Error::embedding("embedding gateway shut down"))?;

        let embedding = tokio::time::timeout(self.timeout, self.provider.embed(text))
            .await
            .map_err(|_| Error::Timeout(format!("embedding via {}", self.provider.name())))??;

        if embedding.len() != self.provider.dimensions() {
            return Err(Error::embedding(format!(
                "provider {} returned {} dimensions, expected {}",
                self.provider.name(),
                embedding.len(),
                self.provider.dimensions()
            )));
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct IndexedEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingProvider for IndexedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(text) {
                return Err(Error::embedding("scripted failure"));
            }
            // derive a distinguishable vector from the text length
            Ok(vec![text.len() as f32, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "indexed"
        }
    }

    fn gateway(provider: IndexedEmbedder) -> EmbeddingGateway {
        EmbeddingGateway::new(
            Arc::new(provider),
            &EmbeddingConfig {
                batch_size: 2,
                max_parallel: 2,
                timeout_secs: 5,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let gw = gateway(IndexedEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let texts = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        let embeddings = gw.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[0][0], 1.0);
        assert_eq!(embeddings[1][0], 2.0);
        assert_eq!(embeddings[2][0], 3.0);
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let gw = gateway(IndexedEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: Some("bb"),
        });
        let texts = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        let err = gw.embed_batch(&texts).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn rejects_wrong_dimensions() {
        struct Short;

        #[async_trait]
        impl EmbeddingProvider for Short {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0])
            }
            fn dimensions(&self) -> usize {
                2
            }
            fn name(&self) -> &str {
                "short"
            }
        }

        let gw = EmbeddingGateway::new(Arc::new(Short), &EmbeddingConfig::default());
        let err = gw.embed_query("x").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}
