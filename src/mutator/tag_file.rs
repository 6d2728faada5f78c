use super::write_lines;
use crate::domain::{SemverEntry, TagFileLine};
use crate::error::{ForgeError, Result};
use crate::template::Render;
use std::fs;
use std::path::Path;

/// What [rewrite_semver_line] changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverChange {
    /// 1-based line number of the replaced line
    pub line_number: usize,
    pub previous: SemverEntry,
    pub rendered: String,
}

/// Replace the version line of a tag file with the rendered template.
///
/// The first line that is neither blank nor a `#` comment must carry a
/// `MAJOR.MINOR.PATCH`; it is replaced as a whole by `template` rendered
/// against `.Major`, `.Minor`, `.Patch` and `.Version`. Later lines are kept.
pub fn rewrite_semver_line(path: &Path, template: &dyn Render) -> Result<SemverChange> {
    let content = fs::read_to_string(path)?;
    let mut lines = Vec::new();
    let mut change: Option<SemverChange> = None;

    for (idx, line) in content.lines().enumerate() {
        let entry = match TagFileLine::classify(line).entry() {
            Some(entry) if change.is_none() => entry,
            _ => {
                lines.push(line.to_string());
                continue;
            }
        };

        let previous = SemverEntry::parse_line(entry)?;
        let rendered = template.render(&previous.to_value()?)?;
        let rendered = rendered.trim_end_matches(['\r', '\n']).to_string();

        tracing::debug!(line = idx + 1, %previous, %rendered, "rewriting tag file version");
        lines.push(rendered.clone());
        change = Some(SemverChange {
            line_number: idx + 1,
            previous,
            rendered,
        });
    }

    let change = change.ok_or_else(|| {
        ForgeError::no_match(path, "a MAJOR.MINOR.PATCH line outside comments")
    })?;
    write_lines(path, &lines)?;
    Ok(change)
}
