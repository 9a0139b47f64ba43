//! Ask the agent a question and print the summary.
//!
//! Progress previews are printed as they arrive.
//!
//! Run with:
//! ```bash
//! AGENT_ENDPOINT=https://<account>.snowflakecomputing.com/api/v2/databases/<db>/schemas/<schema>/agents/<agent>:run \
//! PAT=your-token cargo run --example ask -- "What were sales last quarter?"
//! ```

use cortex_agent::prelude::*;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let query = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    anyhow::ensure!(!query.trim().is_empty(), "usage: ask <question>");

    let client = CortexClient::from_env()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let printer = tokio::spawn(async move {
        while let Some(rendered) = rx.recv().await {
            println!("{rendered}\n---");
        }
    });

    let summary = client.ask_with_progress(&query, &tx).await;
    drop(tx);
    printer.await?;

    if summary.is_error() {
        anyhow::bail!("{}", summary.text);
    }

    println!("\n{}\n", summary.text);
    for sql in &summary.sql_queries {
        println!("SQL:\n{sql}\n");
    }
    for citation in &summary.citations {
        println!("Source: {citation}");
    }
    for suggestion in &summary.suggestions {
        println!("Try: {suggestion}");
    }
    if summary.verified_query_used {
        println!("Answer used a verified query");
    }

    Ok(())
}
