//! Statistics reporting.

use console::style;
use indicatif::HumanBytes;

use crate::download::RunSummary;
use crate::error::ErrorKind;
use crate::queue::{ItemState, QueueSnapshot};

/// Print run totals.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    if summary.profiles_expanded > 0 {
        println!(
            "  Profiles: {} ({} pins discovered)",
            summary.profiles_expanded, summary.pins_discovered
        );
    }
    println!("  Images:    {}", style(summary.images).green());
    println!("  Videos:    {}", style(summary.videos).green());
    println!("  Written:   {}", HumanBytes(summary.bytes));
    if summary.failed > 0 {
        println!("  Failed:    {}", style(summary.failed).red());
    }
    if summary.cancelled > 0 {
        println!("  Cancelled: {}", style(summary.cancelled).yellow());
    }
    println!("{}", style("═".repeat(50)).dim());
}

/// List failed items with their reasons, skipping cancellations.
pub fn print_failures(snapshot: &QueueSnapshot) {
    let failed: Vec<_> = snapshot
        .in_state(ItemState::Failed)
        .filter_map(|item| item.error.as_ref().map(|error| (item, error)))
        .filter(|(_, error)| error.kind != ErrorKind::Cancelled)
        .collect();
    if failed.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Failed items:").bold());
    for (item, error) in failed {
        println!("  {} {} - {}", style(item.id).dim(), item.label(), error);
    }
}
