//! Main workflow orchestration logic
//!
//! A run walks a fixed sequence of states, one transition per step:
//!
//! ```text
//! Cloned -> CheckedOut -> VersionMutated -> TagFileMutated -> Committed
//!        -> TrunkPushed -> BranchForked -> BranchPushed -> TagsProcessed
//! ```
//!
//! The first failing step moves the run to [RunState::Failed] and its error
//! is returned. Completed steps are not undone: a pushed trunk stays pushed
//! even if forking the release branch fails afterwards.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::Oid;
use std::fmt;

use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::BranchName;
use crate::git::{PushStatus, Repository};
use crate::mutator::{bump_version_code, rewrite_semver_line, SemverChange, VersionCodeChange};
use crate::release::{fork_release_branch, TagProcessor, TagReport};

/// Message of the commit carrying the version and tag file changes
pub const VERSION_COMMIT_MESSAGE: &str = "[skip ci] Update Version Code";

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Cloned,
    CheckedOut,
    VersionMutated,
    TagFileMutated,
    Committed,
    TrunkPushed,
    BranchForked,
    BranchPushed,
    TagsProcessed,
    Failed,
}

impl RunState {
    /// The state a successful step leads to; `None` once the run has ended.
    pub fn next(self) -> Option<RunState> {
        use RunState::*;
        match self {
            Cloned => Some(CheckedOut),
            CheckedOut => Some(VersionMutated),
            VersionMutated => Some(TagFileMutated),
            TagFileMutated => Some(Committed),
            Committed => Some(TrunkPushed),
            TrunkPushed => Some(BranchForked),
            BranchForked => Some(BranchPushed),
            BranchPushed => Some(TagsProcessed),
            TagsProcessed | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub version_code: VersionCodeChange,
    pub semver: SemverChange,
    pub trunk_commit: Oid,
    pub trunk_push: PushStatus,
    pub release_branch: BranchName,
    pub branch_push: PushStatus,
    pub tags: TagReport,
    /// Everything worth reporting that did not stop the run
    pub warnings: Vec<BoundaryWarning>,
}

/// One release run over an exclusively owned repository
pub struct ReleaseRun<'a, R: Repository> {
    repo: R,
    config: &'a Config,
    now: DateTime<FixedOffset>,
    state: RunState,
}

impl<'a, R: Repository> ReleaseRun<'a, R> {
    /// Start from a freshly cloned (or opened) repository
    pub fn new(repo: R, config: &'a Config, now: DateTime<FixedOffset>) -> Self {
        ReleaseRun {
            repo,
            config,
            now,
            state: RunState::Cloned,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Execute every remaining step in order.
    ///
    /// A run is attempted once: calling this again after it finished or
    /// failed is an error.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.state != RunState::Cloned {
            anyhow::bail!("release run already finished in state {}", self.state);
        }
        let result = self.run_steps();
        if let Err(e) = &result {
            let message = format!("{:#}", e);
            tracing::debug!(error = %message, "release run failed");
            self.state = RunState::Failed;
        }
        result
    }

    fn run_steps(&mut self) -> Result<RunSummary> {
        let config = self.config;
        let mut warnings = Vec::new();

        self.advance(RunState::CheckedOut, "check out trunk", |run| {
            run.repo.checkout_branch(&config.trunk_branch)
        })?;

        let version_path = config.version_code_path();
        let version_code = self.advance(RunState::VersionMutated, "update version code", |_| {
            bump_version_code(
                &version_path,
                &config.version_code_regex,
                &config.version_code_template,
            )
        })?;
        warnings.extend(version_code.extra_matches.iter().map(|line| {
            BoundaryWarning::ExtraVersionCodeMatch {
                path: config.version_code_file.display().to_string(),
                line: *line,
            }
        }));

        let tag_path = config.tag_file_path();
        let semver = self.advance(RunState::TagFileMutated, "update tag file", |_| {
            rewrite_semver_line(&tag_path, &config.tag_file_template)
        })?;

        let trunk_commit = self.advance(RunState::Committed, "commit version changes", |run| {
            run.repo.commit_all(VERSION_COMMIT_MESSAGE, &config.identity)
        })?;

        let trunk_ref = format!("refs/heads/{}", config.trunk_branch);
        let trunk_push = self.advance(RunState::TrunkPushed, "push trunk", |run| {
            run.repo.push(&trunk_ref)
        })?;
        if trunk_push == PushStatus::UpToDate {
            warnings.push(BoundaryWarning::AlreadyUpToDate { refname: trunk_ref });
        }

        let now = self.now;
        let release_branch = self.advance(RunState::BranchForked, "fork release branch", |run| {
            fork_release_branch(
                &mut run.repo,
                &config.release_branch_template,
                now,
                &config.identity,
            )
        })?;

        let branch_ref = release_branch.refname();
        let branch_push = self.advance(RunState::BranchPushed, "push release branch", |run| {
            run.repo.push(&branch_ref)
        })?;
        if branch_push == PushStatus::UpToDate {
            warnings.push(BoundaryWarning::AlreadyUpToDate { refname: branch_ref });
        }

        let processor = TagProcessor {
            suffix: &config.tag_name_suffix,
            include_version_line: config.tag_version_line,
            identity: &config.identity,
        };
        let tags = self.advance(RunState::TagsProcessed, "process tags", |run| {
            processor.run(&mut run.repo, &tag_path)
        })?;
        warnings.extend(tags.warnings.iter().cloned());

        Ok(RunSummary {
            version_code,
            semver,
            trunk_commit,
            trunk_push,
            release_branch,
            branch_push,
            tags,
            warnings,
        })
    }

    /// Run one step and move to `to` if it succeeds.
    fn advance<T>(
        &mut self,
        to: RunState,
        step: &str,
        f: impl FnOnce(&mut Self) -> crate::Result<T>,
    ) -> Result<T> {
        let from = self.state;
        debug_assert_eq!(from.next(), Some(to), "out-of-order transition");

        let value = f(self).with_context(|| format!("Failed to {} ({} -> {})", step, from, to))?;
        tracing::info!(from = %from, to = %to, "{}", step);
        self.state = to;
        Ok(value)
    }
}
