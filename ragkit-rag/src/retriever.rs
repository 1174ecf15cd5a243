//! Embedding-based document retrieval.
//!
//! [`Retriever`] embeds a [`Corpus`], builds a [`FlatL2Index`] over it and
//! resolves nearest neighbours back to document text. The embedding step can
//! be done once with [`Retriever::index`], producing an immutable
//! [`IndexedCorpus`] that serves any number of queries. [`KnowledgeBase`]
//! holds the current `IndexedCorpus` for callers that need to swap corpora
//! while queries are running.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::document::{Corpus, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::FlatL2Index;

/// Reject queries that are empty or whitespace-only.
pub(crate) fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RagError::EmptyQuery);
    }
    Ok(())
}

/// Orchestrates corpus embedding, index construction and query lookup.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use ragkit_rag::{Corpus, Retriever};
///
/// let retriever = Retriever::new(Arc::new(my_embedder));
/// let corpus = Corpus::from_texts(["Battery life is 10 hours.", "Warranty is 1 year."]);
/// let results = retriever.retrieve(&corpus, "How long does the battery last?", 1).await?;
/// println!("{} (distance {})", results[0].text, results[0].distance);
/// ```
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Create a retriever that embeds documents and queries with `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedding_provider: provider }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Embed every document of `corpus` in one batch and index the result.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if the corpus has no documents. No
    ///   provider call is made in that case.
    /// - [`RagError::EmbeddingProviderError`] if the provider fails or returns
    ///   a different number of embeddings than documents.
    /// - [`RagError::DimensionMismatch`] if the provider returns embeddings of
    ///   differing lengths.
    pub async fn index(&self, corpus: &Corpus) -> Result<IndexedCorpus> {
        if corpus.is_empty() {
            return Err(RagError::EmptyCorpus);
        }

        let texts = corpus.texts();
        let embeddings = self.embedding_provider.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(RagError::embedding(
                self.embedding_provider.name(),
                format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
            ));
        }

        let index = FlatL2Index::build(&embeddings)?;
        debug!(
            provider = self.embedding_provider.name(),
            documents = index.len(),
            dimensions = index.dimensions(),
            "indexed corpus"
        );

        Ok(IndexedCorpus {
            corpus: corpus.clone(),
            index,
            embedding_provider: Arc::clone(&self.embedding_provider),
        })
    }

    /// Retrieve the `k` documents of `corpus` closest to `query`.
    ///
    /// Embeds the corpus, builds an index, embeds the query and searches.
    /// Returns `min(k, corpus.len())` results ordered by ascending distance.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyCorpus`], [`RagError::EmptyQuery`] and
    /// [`RagError::InvalidTopK`] are reported before any provider call.
    /// Provider failures propagate unchanged.
    pub async fn retrieve(
        &self,
        corpus: &Corpus,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if corpus.is_empty() {
            return Err(RagError::EmptyCorpus);
        }
        validate_query(query)?;
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }

        self.index(corpus).await?.search(query, k).await
    }
}

/// A corpus together with its embeddings, ready to answer queries.
///
/// Immutable once built; share it behind an `Arc` to serve concurrent
/// read-only searches. Queries are embedded with the same provider that
/// embedded the corpus.
#[derive(Clone)]
pub struct IndexedCorpus {
    corpus: Corpus,
    index: FlatL2Index,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl IndexedCorpus {
    /// The indexed corpus.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The underlying vector index.
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// Embed `query` and return the `k` closest documents.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyQuery`] and [`RagError::InvalidTopK`] are reported
    /// before the provider is called. [`RagError::DimensionMismatch`] if the
    /// query embedding does not match the corpus embeddings.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        validate_query(query)?;
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }

        let query_embedding = self.embedding_provider.embed(query).await?;
        self.search_embedding(&query_embedding, k)
    }

    /// Return the `k` documents closest to an already computed query embedding.
    pub fn search_embedding(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let neighbors = self.index.search(query_embedding, k)?;
        let results: Vec<RetrievalResult> = neighbors
            .into_iter()
            .filter_map(|n| {
                self.corpus.get(n.id).map(|doc| RetrievalResult {
                    id: doc.id,
                    text: doc.text.clone(),
                    distance: n.distance,
                })
            })
            .collect();

        if let Some(best) = results.first() {
            debug!(
                result_count = results.len(),
                best.id = best.id,
                best.distance = best.distance,
                "search completed"
            );
        }
        Ok(results)
    }
}

/// The current [`IndexedCorpus`] of a session, replaceable at runtime.
///
/// Searches hold a read lock for their whole duration (including the query
/// embedding call). [`rebuild`](KnowledgeBase::rebuild) embeds the new corpus
/// without holding that lock and then installs it under the write lock, so the
/// swap waits for in-flight searches and never interleaves with them.
///
/// Rebuilds are serialized from the embedding step through the swap. When two
/// overlap, the one that was called last is the one left in place.
///
/// # Example
///
/// ```rust,ignore
/// let kb = KnowledgeBase::new(Retriever::new(Arc::new(my_embedder)));
/// kb.rebuild(&Corpus::from_lines(pasted_text)).await?;
/// let results = kb.search("How do I reset my device?", 1).await?;
/// ```
pub struct KnowledgeBase {
    retriever: Retriever,
    current: RwLock<Option<Arc<IndexedCorpus>>>,
    rebuilding: Mutex<()>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever, current: RwLock::new(None), rebuilding: Mutex::new(()) }
    }

    /// Replace the current corpus with `corpus`. Returns the number of
    /// indexed documents.
    ///
    /// On error the previous corpus stays in place.
    pub async fn rebuild(&self, corpus: &Corpus) -> Result<usize> {
        let _rebuilding = self.rebuilding.lock().await;
        let indexed = Arc::new(self.retriever.index(corpus).await?);
        let documents = indexed.corpus().len();

        let mut current = self.current.write().await;
        *current = Some(indexed);
        info!(documents, "knowledge base rebuilt");
        Ok(documents)
    }

    /// Search the current corpus.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyCorpus`] if no corpus has been loaded.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let current = self.current.read().await;
        let indexed = current.as_ref().ok_or(RagError::EmptyCorpus)?;
        indexed.search(query, k).await
    }

    /// Return the current indexed corpus, if any.
    pub async fn snapshot(&self) -> Option<Arc<IndexedCorpus>> {
        self.current.read().await.clone()
    }

    /// Drop the current corpus.
    pub async fn clear(&self) {
        self.current.write().await.take();
    }
}
