//! # Data Chat
//!
//! Chat with Gemini about a CSV file. Every question is sent together with a
//! preview of the file (its header and first rows); the history keeps only
//! what was typed.
//!
//! Requires: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) environment variable.
//!
//! Run: `cargo run --example data_chat --features gemini -- --csv sales.csv`

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use ragkit_rag::{Conversation, GeminiClient, assemble_data_question, csv_preview};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(about = "Ask Gemini questions about a CSV file")]
struct Args {
    /// CSV file to analyze; without it the chat is plain
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Data rows included in the preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Generation model
    #[arg(long, default_value = "gemini-2.5-flash-lite")]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("data_chat")?;
    let args = Args::parse();

    let preview = match &args.csv {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            let preview = csv_preview(&text, args.preview_rows);
            println!("Loaded {}:\n{preview}\n", path.display());
            Some(preview)
        }
        None => None,
    };

    let gemini = GeminiClient::from_env()?.with_model(&args.model);
    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let reply = match &preview {
            Some(preview) => {
                let prompt = assemble_data_question(preview, question);
                conversation.send_with_prompt(&gemini, question, &prompt).await
            }
            None => conversation.send(&gemini, question).await,
        };
        match reply {
            Ok(reply) => println!("gemini> {}\n", reply.trim()),
            Err(e) => eprintln!("error: {e}\n"),
        }
    }

    Ok(())
}
