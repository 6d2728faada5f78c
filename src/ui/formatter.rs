//! Pure formatting functions for UI output.

use crate::cli::RunSummary;
use crate::config::Config;
use crate::git::PushStatus;

/// One `key: value` line per setting, keys aligned
pub fn format_config(config: &Config) -> Vec<String> {
    let entries = config.describe();
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    entries
        .into_iter()
        .map(|(key, value)| format!("{:<width$} : {}", key, value, width = width))
        .collect()
}

fn push_outcome(status: PushStatus) -> &'static str {
    match status {
        PushStatus::Updated => "pushed",
        PushStatus::UpToDate => "already up to date",
    }
}

/// Human-readable lines describing a finished run
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Version code {} -> {} (line {})",
            summary.version_code.previous,
            summary.version_code.current,
            summary.version_code.line_number
        ),
        format!(
            "Tag file version {} -> {}",
            summary.semver.previous, summary.semver.rendered
        ),
        format!(
            "Trunk commit {} {}",
            short_oid(&summary.trunk_commit.to_string()),
            push_outcome(summary.trunk_push)
        ),
        format!(
            "Release branch {} {}",
            summary.release_branch,
            push_outcome(summary.branch_push)
        ),
    ];

    let tags = &summary.tags;
    if tags.created.is_empty() && tags.skipped.is_empty() {
        lines.push("No tags to publish".to_string());
    } else {
        lines.push(format!(
            "Tags created: {} | skipped: {} | pushed: {} | up to date: {}",
            list_or_dash(&tags.created),
            list_or_dash(&tags.skipped),
            list_or_dash(&tags.pushed),
            list_or_dash(&tags.up_to_date)
        ));
    }
    lines
}

fn short_oid(oid: &str) -> &str {
    if oid.len() > 7 {
        &oid[..7]
    } else {
        oid
    }
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
