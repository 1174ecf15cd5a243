//! Retrieval scenarios against deterministic embedders.

mod common;

use std::sync::Arc;

use common::{
    KeywordEmbedder, ShortBatchEmbedder, SkewedEmbedder, UnreachableEmbedder, product_faq,
};
use ragkit_rag::{Corpus, PromptAssembler, RagError, Retriever};

#[tokio::test]
async fn battery_question_retrieves_battery_document() {
    let retriever = Retriever::new(Arc::new(KeywordEmbedder::default()));
    let corpus = Corpus::from_texts(product_faq());

    let results = retriever.retrieve(&corpus, "How long does the battery last?", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 0);
    assert_eq!(results[0].text, "Battery life is 10 hours.");
    assert_eq!(results[0].distance, 0.0);

    let prompt = PromptAssembler::new()
        .assemble_results(&results, "How long does the battery last?");
    assert!(prompt.contains("How long does the battery last?"));
    assert!(prompt.contains("Battery life is 10 hours."));
    assert!(prompt.contains("using ONLY the provided Context"));
    assert!(prompt.contains(ragkit_rag::REFUSAL));
}

#[tokio::test]
async fn empty_corpus_fails_before_any_provider_call() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = Retriever::new(embedder.clone());

    let err = retriever.retrieve(&Corpus::default(), "anything", 1).await.unwrap_err();

    assert!(matches!(err, RagError::EmptyCorpus));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn blank_query_fails_before_any_provider_call() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = Retriever::new(embedder.clone());
    let corpus = Corpus::from_texts(product_faq());

    for query in ["", "   ", "\n\t"] {
        let err = retriever.retrieve(&corpus, query, 1).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyQuery), "query {query:?}");
    }
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn k_larger_than_corpus_returns_every_document_in_order() {
    let retriever = Retriever::new(Arc::new(KeywordEmbedder::default()));
    let corpus = Corpus::from_texts(product_faq());

    let results = retriever.retrieve(&corpus, "battery", 5).await.unwrap();

    assert_eq!(results.len(), 3);
    // distances: battery doc 0, warranty doc 2, reset/power doc 3
    assert_eq!(results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 2, 1]);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = Retriever::new(embedder.clone());
    let err = retriever.retrieve(&Corpus::from_texts(product_faq()), "battery", 0).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidTopK));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn corpus_is_embedded_in_one_batch() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = Retriever::new(embedder.clone());

    retriever.retrieve(&Corpus::from_texts(product_faq()), "warranty", 1).await.unwrap();

    assert_eq!(embedder.batch_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(embedder.single_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_failure_propagates_unchanged() {
    let retriever = Retriever::new(Arc::new(UnreachableEmbedder));
    let err = retriever.retrieve(&Corpus::from_texts(product_faq()), "battery", 1).await.unwrap_err();

    match err {
        RagError::EmbeddingProviderError { provider, message } => {
            assert_eq!(provider, "unreachable");
            assert_eq!(message, "connection refused");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn query_dimension_mismatch_is_reported() {
    let retriever = Retriever::new(Arc::new(SkewedEmbedder { document_dims: 4, query_dims: 3 }));
    let err = retriever.retrieve(&Corpus::from_texts(product_faq()), "battery", 1).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 4, actual: 3 }));
}

#[tokio::test]
async fn short_batch_is_a_provider_error() {
    let retriever = Retriever::new(Arc::new(ShortBatchEmbedder));
    let err = retriever.retrieve(&Corpus::from_texts(product_faq()), "battery", 1).await.unwrap_err();
    match err {
        RagError::EmbeddingProviderError { provider, message } => {
            assert_eq!(provider, "short");
            assert!(message.contains("expected 3 embeddings, got 2"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn indexed_corpus_serves_many_queries_with_one_corpus_embedding() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let retriever = Retriever::new(embedder.clone());
    let indexed = Arc::new(retriever.index(&Corpus::from_texts(product_faq())).await.unwrap());

    let mut handles = Vec::new();
    for (query, expected) in [("battery?", 0), ("reset it", 1), ("warranty terms", 2)] {
        let indexed = Arc::clone(&indexed);
        handles.push(tokio::spawn(async move {
            let results = indexed.search(query, 1).await.unwrap();
            assert_eq!(results[0].id, expected);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(embedder.batch_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(embedder.single_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn pasted_context_is_split_into_line_documents() {
    let retriever = Retriever::new(Arc::new(KeywordEmbedder::default()));
    let corpus = Corpus::from_lines(
        "\nOur warranty covers manufacturing defects for 1 year.\n\n   \n\
         To reset the device, hold the power button for 5 seconds.\n",
    );
    assert_eq!(corpus.len(), 2);

    let results = retriever.retrieve(&corpus, "How do I reset my device?", 1).await.unwrap();
    assert_eq!(results[0].id, 1);
    assert!(results[0].text.starts_with("To reset"));
}
