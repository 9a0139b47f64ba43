//! Replay a recorded transcript through the aggregator.
//!
//! Run with:
//! ```bash
//! cargo run --example replay -- sample_responses.txt
//! ```

use cortex_agent::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: replay <transcript>"))?;
    let text = std::fs::read_to_string(&path)?;

    let responses = parse_transcript(&text);
    tracing::info!(path = %path, responses = responses.len(), "Parsed transcript");

    for (i, response) in responses.iter().enumerate() {
        let summary = Summary::extract(response);
        println!("=== Response {} ===", i + 1);
        if let Some(id) = &summary.request_id {
            println!("Request: {id}");
        }
        for update in &summary.planning_updates {
            println!("• {}", smart_truncate(update, 120));
        }
        println!("{}", summary.text);
        println!(
            "{} SQL queries, {} citations, {} tool uses\n",
            summary.sql_queries.len(),
            summary.citations.len(),
            summary.tool_uses
        );
    }

    Ok(())
}
