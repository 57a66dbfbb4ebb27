use anyhow::Result;
use colored::Colorize;

use super::Backend;
use crate::OutputFormat;

pub async fn handle(backend: &Backend, output: &OutputFormat) -> Result<()> {
    let metrics = backend.metrics().await?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        OutputFormat::Compact => {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                metrics.total_events,
                metrics.workflows_processed,
                metrics.suggestions_made,
                metrics.fixes_applied,
                metrics.estimates_requested,
                metrics.errors_recorded
            );
        }
        OutputFormat::Pretty => {
            println!("{} {}", "Metrics from".bold().cyan(), backend.describe().bright_black());
            println!();
            println!("  Total events:        {}", metrics.total_events.to_string().green());
            println!("  Workflows processed: {}", metrics.workflows_processed);
            println!("  Suggestions made:    {}", metrics.suggestions_made);
            println!("  Fixes applied:       {}", metrics.fixes_applied);
            println!("  Estimates requested: {}", metrics.estimates_requested);

            let errors = metrics.errors_recorded.to_string();
            if metrics.errors_recorded > 0 {
                println!("  Errors recorded:     {}", errors.red());
            } else {
                println!("  Errors recorded:     {}", errors);
            }

            if !metrics.events_by_type.is_empty() {
                println!();
                println!("{}", "By event type:".bold());
                for (event_type, count) in &metrics.events_by_type {
                    println!("  {:<12} {}", event_type.yellow(), count);
                }
            }
        }
    }

    Ok(())
}
