//! # List Models
//!
//! Prints the Gemini models available to your API key with the methods each
//! supports.
//!
//! Requires: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) environment variable.
//!
//! Run: `cargo run --example list_models --features gemini -- --method embedContent`

use clap::Parser;
use ragkit_rag::GeminiClient;

#[derive(Parser)]
#[command(about = "List Gemini models")]
struct Args {
    /// Only show models supporting this method, e.g. generateContent
    #[arg(long)]
    method: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("list_models")?;
    let args = Args::parse();

    let models = GeminiClient::from_env()?.list_models().await?;
    let models: Vec<_> = models
        .into_iter()
        .filter(|m| args.method.as_deref().is_none_or(|method| m.supports(method)))
        .collect();

    if args.json {
        let entries: Vec<_> = models
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "display_name": m.display_name,
                    "methods": m.supported_generation_methods,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for model in &models {
        println!("{} {:?}", model.name, model.supported_generation_methods);
    }
    println!("\n{} model(s)", models.len());
    Ok(())
}
