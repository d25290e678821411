//! CLI output formatting

use crate::{
    core::{ExecutionStatus, ReleaseId},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a task runs
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_tasks,
        } => format!(
            "{} Starting {} ({} tasks, {})",
            ROCKET,
            style(pipeline_name).bold(),
            total_tasks,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::TaskStarted {
            index,
            total,
            name,
            description,
        } => format!(
            "{} [{}/{}] {} {}",
            SPINNER,
            index + 1,
            total,
            style(name).cyan(),
            style(description).dim()
        ),
        ExecutionEvent::TaskCompleted { name, .. } => format!("{} {}", CHECK, style(name).green()),
        ExecutionEvent::TaskSkipped { name, reason } => {
            format!("{} {} ({})", SKIP, style(name).dim(), reason)
        }
        ExecutionEvent::TaskFailed { name, error } => {
            format!("{} {}: {}", CROSS, style(name).red(), style(error).dim())
        }
        ExecutionEvent::PipelineCompleted { execution_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format task output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

/// Format the release listing, newest last, marking the live release
pub fn format_releases(releases: &[ReleaseId], current: Option<&ReleaseId>) -> String {
    releases
        .iter()
        .map(|release| {
            if Some(release) == current {
                format!("  {} {}", style(release).green().bold(), style("(current)").green())
            } else {
                format!("  {}", release)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
