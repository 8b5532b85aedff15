use chrono::Utc;
use clap::{Parser, Subcommand};

use flipscout_analysis::types::ProductInsight;
use flipscout_analysis::AnalysisEngine;

#[derive(Debug, Parser)]
#[command(name = "flipscout-cli")]
#[command(about = "Flipscout product research from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Full analysis: resale value, engagement, and order volume.
    Analyze {
        /// Product description to research.
        query: String,
    },
    /// Social engagement summaries only.
    Engagement {
        /// Product description to research.
        query: String,
    },
    /// Marketplace order volume only.
    Volume {
        /// Product description to research.
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = flipscout_core::load_app_config()?;
    let engine = AnalysisEngine::from_config(&config)?;
    tracing::debug!(command = ?cli.command, "engine ready");

    match cli.command {
        Commands::Analyze { query } => {
            let insight = ProductInsight::from_description(&query);
            let metrics = engine.analyze(&insight).await;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Engagement { query } => {
            let windows = engine.engagement_metrics(&query, Utc::now()).await?;
            match windows {
                Some(windows) => println!("{}", serde_json::to_string_pretty(&windows)?),
                None => println!("no engagement data found for \"{query}\""),
            }
        }
        Commands::Volume { query } => {
            let volume = engine.order_volume(&query).await?;
            match volume {
                Some(volume) => println!("{}", serde_json::to_string_pretty(&volume)?),
                None => println!("no order volume data found for \"{query}\""),
            }
        }
    }

    Ok(())
}
