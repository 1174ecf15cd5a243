//! # Data Agent
//!
//! Gemini looks at a preview of a CSV file and picks one analysis (summary
//! statistics or correlations). The analysis runs locally and Gemini writes
//! a short report from the result.
//!
//! Requires: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) environment variable.
//!
//! Run: `cargo run --example data_agent --features gemini -- --csv sales.csv`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ragkit_rag::{DataAnalyst, DataTable, GeminiClient};

#[derive(Parser)]
#[command(about = "Let Gemini choose and explain an analysis of a CSV file")]
struct Args {
    /// CSV file to analyze
    #[arg(long)]
    csv: PathBuf,

    /// What the analysis should achieve
    #[arg(long, default_value = "Provide insights about the dataset.")]
    goal: String,

    /// Data rows shown to the model
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Generation model
    #[arg(long, default_value = "gemini-2.5-flash-lite")]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("data_agent")?;
    let args = Args::parse();

    let table = DataTable::parse(&tokio::fs::read_to_string(&args.csv).await?)?;
    let gemini = GeminiClient::from_env()?.with_model(&args.model);
    let analyst = DataAnalyst::new(Arc::new(gemini)).with_preview_rows(args.preview_rows);

    let outcome = analyst.run(&table, &args.goal).await?;

    println!("Model decision: {}", outcome.decision.trim());
    match outcome.tool {
        Some(tool) => println!("Ran {tool:?}:\n{}\n", outcome.observation),
        None => println!("{}\n", outcome.observation),
    }
    println!("Final insight report:\n{}", outcome.report.trim());
    Ok(())
}
