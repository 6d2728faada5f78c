use super::write_lines;
use crate::domain::VersionCodeLine;
use crate::error::{ForgeError, Result};
use crate::template::{Render, Value};
use regex::Regex;
use std::fs;
use std::path::Path;

/// What [bump_version_code] changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCodeChange {
    /// 1-based line number of the rewritten line
    pub line_number: usize,
    pub previous: u64,
    pub current: u64,
    /// Further lines that matched the pattern and were left alone
    pub extra_matches: Vec<usize>,
}

/// Increment the version code in `path`.
///
/// The first line matching `pattern` is rewritten: its first digit run is
/// rendered through `template` (with the current code as `.`) and replaced by
/// the result. Every other line is kept as is.
///
/// # Returns
/// * `Ok(VersionCodeChange)` - The file was rewritten
/// * `Err(ForgeError::NoMatch)` - No line matched; the file is untouched
/// * `Err(ForgeError::Parse)` - The code or the rendered value is not an integer
pub fn bump_version_code(
    path: &Path,
    pattern: &Regex,
    template: &dyn Render,
) -> Result<VersionCodeChange> {
    let content = fs::read_to_string(path)?;
    let mut lines = Vec::new();
    let mut change: Option<VersionCodeChange> = None;

    for (idx, line) in content.lines().enumerate() {
        if !pattern.is_match(line) {
            lines.push(line.to_string());
            continue;
        }

        if let Some(change) = change.as_mut() {
            change.extra_matches.push(idx + 1);
            lines.push(line.to_string());
            continue;
        }

        let code_line = VersionCodeLine::parse(line)?;
        let previous = code_line.code();
        let input = i64::try_from(previous)
            .map_err(|_| ForgeError::parse(format!("Version code {} is too large", previous)))?;
        let rendered = template.render(&Value::Int(input))?;
        let current = rendered.trim().parse::<u64>().map_err(|e| {
            ForgeError::parse(format!(
                "Version code template produced '{}': {}",
                rendered, e
            ))
        })?;

        tracing::debug!(line = idx + 1, previous, current, "rewriting version code");
        lines.push(code_line.with_code(current));
        change = Some(VersionCodeChange {
            line_number: idx + 1,
            previous,
            current,
            extra_matches: Vec::new(),
        });
    }

    let change = change.ok_or_else(|| ForgeError::no_match(path, pattern.as_str()))?;
    write_lines(path, &lines)?;
    Ok(change)
}
