//! In-place rewriting of the tracked version and tag files.
//!
//! Each mutator pairs an extraction pattern with a [Render](crate::template::Render)
//! step. The new file content is built completely in memory and written in
//! one go, so a failed mutation leaves the file as it was.

pub mod tag_file;
pub mod version_code;

pub use tag_file::{rewrite_semver_line, SemverChange};
pub use version_code::{bump_version_code, VersionCodeChange};

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write `lines` back to `path`, each terminated by `\n`.
fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
