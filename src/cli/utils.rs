//! Console output helpers

use colored::*;

use crate::session::{SessionError, SessionSummary};

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions<E: std::fmt::Display>(error: &E, context: &str, app_name: Option<&str>) {
    let app = app_name.unwrap_or("sessionkit");

    eprintln!("{} {}", "❌ Error:".red().bold(), context);
    eprintln!("   {}", error.to_string().red());

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("mode is not supported") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Use --mode normal or --mode follower");
        eprintln!("   • Check the SESSIONKIT_MODE environment variable");
    } else if error_str.contains("no such file or directory") || error_str.contains("cannot access") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Check that the plan file or directory path is correct");
        eprintln!("   • Run '{} --mode follower --plan <dir>' to replay every plan in a folder", app);
    } else if error_str.contains("invalid plan file") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Plans are JSON objects with task, object and steps fields");
    } else if error_str.contains("permission denied") {
        eprintln!("{}", "💡 Suggestions:".blue());
        eprintln!("   • Check file permissions");
        eprintln!("   • Ensure the log and experience directories are writable");
    }
}

/// Print a session error using its friendlier wording
pub fn display_session_error(error: &SessionError) {
    display_error_with_suggestions(&error.user_friendly_message(), "session failed", None);
}

/// One-line colored report of a finished session
pub fn print_summary(summary: &SessionSummary) {
    let status = if summary.failed_rounds.is_empty() {
        "completed".green()
    } else {
        format!("{} failed round(s)", summary.failed_rounds.len()).yellow()
    };
    println!(
        "{} [{}] {} ({} mode): {} round(s), {}",
        "■".cyan(),
        summary.id,
        truncate_with_ellipsis(&summary.task, 48).bold(),
        summary.mode,
        summary.total_rounds,
        status
    );
    if summary.experience_saved {
        println!("  {}", "experience saved".dimmed());
    }
}

/// Truncate text with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
