//! # Compare Embeddings
//!
//! Embeds three sentences and prints the cosine similarity of every pair.
//! The defaults use "apple" as a fruit and as a company, next to a sentence
//! about an orange, so the fruit sentences score closer to each other.
//!
//! Requires: `HF_TOKEN` environment variable.
//!
//! Run: `cargo run --example compare_embeddings --features huggingface`

use clap::Parser;
use ragkit_rag::{EmbeddingProvider, HuggingFaceEmbeddingProvider, cosine_similarity};

#[derive(Parser)]
#[command(about = "Compare sentence embeddings by cosine similarity")]
struct Args {
    #[arg(long, default_value = "He ate a fresh apple and enjoyed the fruit.")]
    first: String,

    #[arg(long, default_value = "Apple released a new product in the computer market.")]
    second: String,

    #[arg(long, default_value = "An orange is a juicy fruit.")]
    third: String,

    /// Feature-extraction model
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("compare_embeddings")?;
    let args = Args::parse();

    let mut provider = HuggingFaceEmbeddingProvider::from_env()?;
    if let Some(model) = args.model {
        provider = provider.with_model(model);
    }

    let sentences = [args.first.as_str(), args.second.as_str(), args.third.as_str()];
    let embeddings = provider.embed_batch(&sentences).await?;
    anyhow::ensure!(
        embeddings.len() == sentences.len(),
        "expected {} embeddings, got {}",
        sentences.len(),
        embeddings.len()
    );

    println!("Cosine similarity:");
    for (a, b) in [(0, 1), (0, 2), (1, 2)] {
        let similarity = cosine_similarity(&embeddings[a], &embeddings[b]);
        println!("  {} <-> {}: {similarity:.4}", a + 1, b + 1);
    }
    for (i, sentence) in sentences.iter().enumerate() {
        println!("  [{}] {sentence}", i + 1);
    }
    Ok(())
}
