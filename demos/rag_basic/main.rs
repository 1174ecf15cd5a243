//! # RAG Basic Example
//!
//! Runs the whole pipeline offline: pasted lines become a corpus, each
//! question retrieves its closest line, and a canned generator echoes the
//! context it was given.
//!
//! Uses a deterministic `HashEmbeddingProvider` so it runs with **zero API keys**.
//!
//! Run: `cargo run --example rag_basic`

use std::sync::Arc;

use async_trait::async_trait;
use ragkit_rag::{
    Corpus, EmbeddingProvider, GenerationProvider, Message, RagConfig, RagPipeline, REFUSAL,
};

const PRODUCT_FAQ: &str = "\
Battery life is 10 hours.
Reset by holding power button 5 seconds.

Warranty is 1 year.
";

/// Bag-of-words embeddings hashed into a fixed number of buckets.
struct HashEmbeddingProvider {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, text: &str) -> ragkit_rag::Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }
}

/// Replies with the first context line, or the refusal when there is none.
struct ContextEchoGenerator;

#[async_trait]
impl GenerationProvider for ContextEchoGenerator {
    fn name(&self) -> &str {
        "context-echo"
    }

    async fn generate_chat(&self, messages: &[Message]) -> ragkit_rag::Result<String> {
        let prompt = messages.last().map(|m| m.text.as_str()).unwrap_or_default();
        let context = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.lines().next())
            .filter(|line| !line.trim().is_empty());
        Ok(context.map_or_else(|| REFUSAL.to_string(), |line| format!("According to the context: {line}")))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ragkit_telemetry::init_telemetry("rag_basic")?;

    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().top_k(1).build()?)
        .embedding_provider(Arc::new(HashEmbeddingProvider { dimensions: 64 }))
        .generation_provider(Arc::new(ContextEchoGenerator))
        .build()?;

    let corpus = Corpus::from_lines(PRODUCT_FAQ);
    println!("Indexing {} documents...", corpus.len());
    let indexed = pipeline.index(&corpus).await?;

    let questions = [
        "How long does the battery last?",
        "How do I reset the device?",
        "How long is the warranty?",
    ];

    for question in questions {
        println!("\nQuestion: {question}");
        let answer = pipeline.answer_indexed(&indexed, question).await?;
        for hit in &answer.retrieved {
            println!("  [doc {} | distance={:.4}] {}", hit.id, hit.distance, hit.text);
        }
        println!("Answer: {}", answer.answer);
    }

    println!("\nDone.");
    Ok(())
}
