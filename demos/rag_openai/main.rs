//! # RAG with OpenAI
//!
//! Same flow as `rag_gemini`, with OpenAI embeddings and chat completions.
//! The context file is split into one document per non-blank line; without
//! one, a small product FAQ is used.
//!
//! Requires: `OPENAI_API_KEY` environment variable.
//!
//! Run: `cargo run --example rag_openai --features openai -- "How do I reset the device?"`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ragkit_rag::{Corpus, OpenAIChatProvider, OpenAIEmbeddingProvider, RagConfig, RagPipeline};

const PRODUCT_FAQ: &str = "\
Battery life is 10 hours.
Reset by holding power button 5 seconds.
Warranty is 1 year.";

#[derive(Parser)]
#[command(about = "Answer questions from pasted context with OpenAI")]
struct Args {
    /// File whose non-blank lines form the corpus
    #[arg(long)]
    context: Option<PathBuf>,

    /// Number of documents placed in the prompt
    #[arg(long, default_value_t = 1)]
    top_k: usize,

    /// Chat model, e.g. gpt-4o-mini
    #[arg(long)]
    model: Option<String>,

    /// Questions to answer
    #[arg(required = true)]
    questions: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("rag_openai")?;
    let args = Args::parse();

    let text = match &args.context {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => PRODUCT_FAQ.to_string(),
    };
    let corpus = Corpus::from_lines(&text);

    let mut chat = OpenAIChatProvider::from_env()?;
    if let Some(model) = args.model {
        chat = chat.with_model(model);
    }

    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().top_k(args.top_k).build()?)
        .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
        .generation_provider(Arc::new(chat))
        .build()?;

    let indexed = pipeline.index(&corpus).await?;
    for question in &args.questions {
        let answer = pipeline.answer_indexed(&indexed, question).await?;
        println!("Q: {question}");
        println!("A: {}", answer.answer.trim());
        if answer.is_refusal() {
            println!("   (not covered by the context)");
        }
        println!();
    }
    Ok(())
}
