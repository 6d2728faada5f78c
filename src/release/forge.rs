use crate::domain::BranchName;
use crate::error::Result;
use crate::git::{Identity, Repository};
use crate::template::{Render, Value};
use chrono::{DateTime, FixedOffset};

/// Message of the empty commit that starts every release branch
pub const DIVERGE_MESSAGE: &str = "diverge from master";

/// Render the release branch name for `now`.
///
/// The template sees the timestamp as `.`, so `{{Week .}}`, `{{.Week}}` and
/// `{{.Year}}` are all available.
pub fn render_branch_name(template: &dyn Render, now: DateTime<FixedOffset>) -> Result<BranchName> {
    let rendered = template.render(&Value::Time(now))?;
    BranchName::new(rendered)
}

/// Fork a release branch off HEAD and give it its marker commit.
///
/// The branch is created at the current HEAD, checked out, and receives one
/// empty commit so it differs from the trunk at the ref level. Returns the
/// branch name for the push that follows.
pub fn fork_release_branch<R: Repository + ?Sized>(
    repo: &mut R,
    template: &dyn Render,
    now: DateTime<FixedOffset>,
    identity: &Identity,
) -> Result<BranchName> {
    let branch = render_branch_name(template, now)?;
    tracing::info!(branch = %branch, "creating release branch");

    repo.create_branch(&branch)?;
    let marker = repo.commit_empty(DIVERGE_MESSAGE, identity)?;
    tracing::debug!(branch = %branch, %marker, "recorded divergence commit");

    Ok(branch)
}
