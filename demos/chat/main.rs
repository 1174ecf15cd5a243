//! # Chat
//!
//! A terminal chat with Gemini. The whole conversation is resent on each turn,
//! so the model sees earlier messages. Type `/reset` to start over.
//!
//! Requires: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) environment variable.
//!
//! Run: `cargo run --example chat --features gemini`

use std::io::Write;

use clap::Parser;
use ragkit_rag::{Conversation, GeminiClient};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(about = "Chat with Gemini in the terminal")]
struct Args {
    /// Generation model, e.g. gemini-2.5-flash
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("chat")?;
    let args = Args::parse();

    let mut gemini = GeminiClient::from_env()?;
    if let Some(model) = &args.model {
        gemini = gemini.with_model(model);
    }
    if let Some(temperature) = args.temperature {
        gemini = gemini.with_temperature(temperature);
    }

    println!("Chatting with {} (Ctrl-D to quit, /reset to clear history)", gemini.model());
    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/reset" {
            conversation.clear();
            println!("(history cleared)");
            continue;
        }

        match conversation.send(&gemini, line).await {
            Ok(reply) => println!("model> {}\n", reply.trim()),
            // the failed turn is not kept, so the user can simply retry
            Err(e) => eprintln!("error: {e}\n"),
        }
    }

    println!("\n{} messages exchanged.", conversation.len());
    Ok(())
}
