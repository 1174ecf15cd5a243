//! # RAG with Gemini
//!
//! Answers questions from pasted context using Gemini for both embeddings and
//! generation. The context file is split into one document per non-blank
//! line; without one, a small product FAQ is used.
//!
//! Requires: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) environment variable.
//!
//! Run: `cargo run --example rag_gemini --features gemini -- "How long does the battery last?"`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ragkit_rag::{Corpus, GeminiClient, RagConfig, RagPipeline};
use tokio::io::{AsyncBufReadExt, BufReader};

const PRODUCT_FAQ: &str = "\
Battery life is 10 hours.
Reset by holding power button 5 seconds.
Warranty is 1 year.";

#[derive(Parser)]
#[command(about = "Answer questions from pasted context with Gemini")]
struct Args {
    /// File whose non-blank lines form the corpus
    #[arg(long)]
    context: Option<PathBuf>,

    /// Number of documents placed in the prompt
    #[arg(long, default_value_t = 1)]
    top_k: usize,

    /// Character budget for retrieved context
    #[arg(long)]
    max_context_chars: Option<usize>,

    /// Generation model, e.g. gemini-2.5-flash
    #[arg(long)]
    model: Option<String>,

    /// Print the assembled prompt before each answer
    #[arg(long)]
    show_prompt: bool,

    /// Questions to answer; reads one per line from stdin when omitted
    questions: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("rag_gemini")?;
    let args = Args::parse();

    let text = match &args.context {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => PRODUCT_FAQ.to_string(),
    };
    let corpus = Corpus::from_lines(&text);

    let mut config = RagConfig::builder().top_k(args.top_k);
    if let Some(chars) = args.max_context_chars {
        config = config.max_context_chars(chars);
    }

    let mut gemini = GeminiClient::from_env()?;
    if let Some(model) = &args.model {
        gemini = gemini.with_model(model);
    }
    let gemini = Arc::new(gemini);

    let pipeline = RagPipeline::builder()
        .config(config.build()?)
        .embedding_provider(gemini.clone())
        .generation_provider(gemini)
        .build()?;

    println!("Indexing {} documents...", corpus.len());
    let indexed = pipeline.index(&corpus).await?;

    let questions = if args.questions.is_empty() {
        println!("Ask a question (Ctrl-D to quit):");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut questions = Vec::new();
        while let Some(line) = lines.next_line().await? {
            questions.push(line);
        }
        questions
    } else {
        args.questions
    };

    for question in questions.iter().filter(|q| !q.trim().is_empty()) {
        let answer = pipeline.answer_indexed(&indexed, question).await?;
        if args.show_prompt {
            println!("--- prompt ---\n{}--------------", answer.prompt);
        }
        println!("Q: {question}");
        println!("A: {}", answer.answer.trim());
        if answer.is_refusal() {
            println!("   (not covered by the context)");
        }
        println!();
    }

    Ok(())
}
