use owo_colors::OwoColorize;

use rankwatch_core::{PublishOutcome, ScrapeReport};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Rankwatch".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Scrape ranked app and model leaderboards\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print per-period counts of a finished scrape
pub fn print_report_summary(report: &ScrapeReport) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", format!("Scrape Summary ({})", report.category).bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for partition in &report.partitions {
        let strategy = partition.strategy.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        match &partition.error {
            Some(error) => eprintln!(
                "  {} {} {}",
                format!("{}:", partition.time_period).dimmed(),
                "failed".bright_red(),
                error.dimmed()
            ),
            None => eprintln!(
                "  {} {} {}",
                format!("{}:", partition.time_period).dimmed(),
                partition.entities.len().to_string().bright_white(),
                format!("({})", strategy).dimmed()
            ),
        }
    }

    eprintln!(
        "  {} {}\n",
        "Total:".bold().dimmed(),
        report.total().to_string().bright_white()
    );
}

/// Print where published records ended up
pub fn print_publish_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Stored { rows } => print_success(&format!("Stored {} rows", rows)),
        PublishOutcome::Exported(path) => {
            print_warning(&format!("Sink unavailable, records exported to {}", path.display().bright_white()))
        }
        PublishOutcome::Empty => print_warning("No records to store"),
    }
}
