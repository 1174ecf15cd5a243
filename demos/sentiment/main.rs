//! # Batch Sentiment
//!
//! Classifies each non-blank line of the input as positive or negative.
//!
//! Requires: `HF_TOKEN` environment variable.
//!
//! Run: `printf 'I hate this product\nThis is amazing!\n' | cargo run --example sentiment --features huggingface`

use clap::Parser;
use ragkit_nlp::{HuggingFaceTasks, Task, TextClassifier, split_nonblank_lines};
use tokio::io::AsyncReadExt;

const SAMPLE: &str = "I hate this product\nThis is amazing!\nIt's okay, nothing special";

#[derive(Parser)]
#[command(about = "Classify the sentiment of each input line")]
struct Args {
    /// Read lines from stdin instead of the built-in sample
    #[arg(long)]
    stdin: bool,

    /// Classification model
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("sentiment")?;
    let args = Args::parse();

    let raw = if args.stdin {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        SAMPLE.to_string()
    };

    let texts = split_nonblank_lines(&raw);
    if texts.is_empty() {
        println!("Please enter at least one line.");
        return Ok(());
    }

    let mut hf = HuggingFaceTasks::from_env()?;
    if let Some(model) = args.model {
        hf = hf.with_model(Task::Sentiment, model);
    }

    let results = hf.classify(&texts).await?;
    for (text, sentiment) in texts.iter().zip(&results) {
        println!("Text: {text}");
        println!("Sentiment: {}, Score: {:.4}", sentiment.label, sentiment.score);
        println!("---");
    }
    Ok(())
}
