//! # NLP Tasks
//!
//! One subcommand per hosted task pipeline: entity recognition, extractive
//! question answering, summarization, translation and text generation.
//!
//! Requires: `HF_TOKEN` environment variable.
//!
//! Run: `cargo run --example nlp_tasks --features huggingface -- ner "John lives in New York."`

use clap::{Parser, Subcommand};
use ragkit_nlp::{
    GenerationParams, HuggingFaceTasks, QuestionAnswerer, Summarizer, SummaryLength,
    TextGenerator, TokenClassifier, Translator,
};

#[derive(Parser)]
#[command(about = "Run a hosted NLP task")]
struct Cli {
    #[command(subcommand)]
    task: TaskCommand,
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Named entity recognition
    Ner {
        #[arg(default_value = "John lives in New York and works at Google.")]
        text: String,
    },
    /// Answer a question from a context passage
    Qa {
        #[arg(long, default_value = "What does Hugging Face build?")]
        question: String,
        #[arg(
            long,
            default_value = "Hugging Face is a company that develops tools for building \
                             applications using machine learning. The company was founded \
                             in 2016 and is headquartered in New York."
        )]
        context: String,
    },
    /// Summarize a passage
    Summarize {
        text: String,
        #[arg(long, default_value_t = 20)]
        min_length: usize,
        #[arg(long, default_value_t = 50)]
        max_length: usize,
    },
    /// Translate English to French
    Translate {
        #[arg(default_value = "Hello, how are you?")]
        text: String,
    },
    /// Continue a prompt
    Generate {
        #[arg(default_value = "The future of AI is")]
        prompt: String,
        #[arg(long, default_value_t = 50)]
        max_length: usize,
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,
        /// Disable sampling
        #[arg(long)]
        greedy: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("nlp_tasks")?;
    let cli = Cli::parse();
    let hf = HuggingFaceTasks::from_env()?;

    match cli.task {
        TaskCommand::Ner { text } => {
            for entity in hf.extract_entities(&text).await? {
                println!(
                    "{:<6} {:<20} {:.4} [{}..{}]",
                    entity.entity_group, entity.word, entity.score, entity.start, entity.end
                );
            }
        }
        TaskCommand::Qa { question, context } => {
            let answer = hf.answer(&question, &context).await?;
            println!("{} (score {:.4}, chars {}..{})", answer.answer, answer.score, answer.start, answer.end);
        }
        TaskCommand::Summarize { text, min_length, max_length } => {
            let summary = hf.summarize(&text, SummaryLength::new(min_length, max_length)?).await?;
            println!("{}", summary.summary_text);
        }
        TaskCommand::Translate { text } => {
            println!("{}", hf.translate(&text).await?.translation_text);
        }
        TaskCommand::Generate { prompt, max_length, temperature, greedy } => {
            let params = if greedy { GenerationParams::greedy() } else { GenerationParams::default() }
                .with_max_length(max_length)
                .with_temperature(temperature);
            for generated in hf.generate(&prompt, params).await? {
                println!("{}", generated.generated_text);
            }
        }
    }
    Ok(())
}
