use crate::boundary::BoundaryWarning;
use crate::domain::{active_entries, is_bare_semver, Tag};
use crate::error::Result;
use crate::git::{Identity, PushStatus, Repository};
use std::fs;
use std::path::Path;

/// What [TagProcessor::run] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagReport {
    /// Tags created locally
    pub created: Vec<String>,
    /// Tags that already existed locally
    pub skipped: Vec<String>,
    /// Tags the remote accepted
    pub pushed: Vec<String>,
    /// Tags the remote already had
    pub up_to_date: Vec<String>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Pending tags in a tag file, in file order.
///
/// A leading bare `MAJOR.MINOR.PATCH` line is the file's version header and
/// is left out unless `include_version_line` is set.
pub fn pending_tags(content: &str, suffix: &str, include_version_line: bool) -> Vec<Tag> {
    let entries = active_entries(content);
    let skip = match entries.first() {
        Some(first) if !include_version_line && is_bare_semver(first) => 1,
        _ => 0,
    };
    entries
        .into_iter()
        .skip(skip)
        .map(|base| Tag::with_suffix(base, suffix))
        .collect()
}

/// Turns the pending entries of a tag file into pushed tags
#[derive(Debug, Clone)]
pub struct TagProcessor<'a> {
    pub suffix: &'a str,
    pub include_version_line: bool,
    pub identity: &'a Identity,
}

impl TagProcessor<'_> {
    /// Tag HEAD with every pending tag, then push them all.
    ///
    /// A tag that already exists locally is skipped with a warning; any other
    /// creation error stops the run. Pushes happen afterwards in file order,
    /// an up-to-date remote counts as success, and the first failing push
    /// stops the rest.
    pub fn run<R: Repository + ?Sized>(&self, repo: &mut R, tag_file: &Path) -> Result<TagReport> {
        let content = fs::read_to_string(tag_file)?;
        let tags = pending_tags(&content, self.suffix, self.include_version_line);
        let mut report = TagReport::default();

        if tags.is_empty() {
            tracing::info!(path = %tag_file.display(), "no pending tags");
            report.warnings.push(BoundaryWarning::NoPendingTags {
                path: tag_file.display().to_string(),
            });
            return Ok(report);
        }

        for tag in &tags {
            match repo.create_tag(&tag.name, self.identity) {
                Ok(_) => {
                    tracing::info!(tag = %tag.name, "created tag");
                    report.created.push(tag.name.clone());
                }
                Err(e) if e.is_tag_exists() => {
                    tracing::warn!(tag = %tag.name, "tag already exists locally, skipping");
                    report.skipped.push(tag.name.clone());
                    report.warnings.push(BoundaryWarning::TagAlreadyExists {
                        tag: tag.name.clone(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        for tag in &tags {
            match repo.push(&tag.refname())? {
                PushStatus::Updated => {
                    tracing::info!(tag = %tag.name, "pushed tag");
                    report.pushed.push(tag.name.clone());
                }
                PushStatus::UpToDate => {
                    tracing::info!(tag = %tag.name, "remote tag already up to date");
                    report.up_to_date.push(tag.name.clone());
                    report.warnings.push(BoundaryWarning::AlreadyUpToDate {
                        refname: tag.refname(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity::new("Bitrise", "bitrise@bitrise.io")
    }

    fn setup(content: &str) -> (TempDir, MockRepository) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tags.txt"), content).unwrap();
        let repo = MockRepository::new(dir.path(), "master");
        (dir, repo)
    }

    fn run(repo: &mut MockRepository, dir: &TempDir, suffix: &str) -> Result<TagReport> {
        let identity = identity();
        let processor = TagProcessor {
            suffix,
            include_version_line: false,
            identity: &identity,
        };
        processor.run(repo, &dir.path().join("tags.txt"))
    }

    #[test]
    fn test_pending_tags_skip_version_header() {
        let tags = pending_tags("# header\n1.2.3\nbeta-candidate\n", "-rc1", false);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["beta-candidate-rc1"]);
    }

    #[test]
    fn test_pending_tags_can_include_version_line() {
        let tags = pending_tags("1.2.4\nbeta\n", "-rc1", true);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1.2.4-rc1", "beta-rc1"]);
    }

    #[test]
    fn test_pending_tags_keep_non_semver_first_line() {
        let tags = pending_tags("v1.2.3\nbeta\n", "", false);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v1.2.3");
    }

    #[test]
    fn test_creates_and_pushes_suffixed_tags() {
        let (dir, mut repo) = setup("# header\n1.2.3\nbeta-candidate\n");
        let report = run(&mut repo, &dir, "-rc1").unwrap();

        assert_eq!(report.created, vec!["beta-candidate-rc1"]);
        assert_eq!(report.pushed, vec!["beta-candidate-rc1"]);
        assert_eq!(repo.tag_names(), vec!["beta-candidate-rc1"]);
        assert!(repo.remote_ref("refs/tags/beta-candidate-rc1").is_some());
        assert_eq!(
            fs::read_to_string(dir.path().join("tags.txt")).unwrap(),
            "# header\n1.2.3\nbeta-candidate\n"
        );
    }

    #[test]
    fn test_existing_tag_is_skipped_and_others_continue() {
        let (dir, mut repo) = setup("1.0.0\nalpha\nbeta\n");
        repo.add_tag("alpha-rc1");
        let report = run(&mut repo, &dir, "-rc1").unwrap();

        assert_eq!(report.skipped, vec!["alpha-rc1"]);
        assert_eq!(report.created, vec!["beta-rc1"]);
        assert_eq!(report.pushed, vec!["alpha-rc1", "beta-rc1"]);
        assert!(report.warnings.contains(&BoundaryWarning::TagAlreadyExists {
            tag: "alpha-rc1".to_string()
        }));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (dir, mut repo) = setup("1.0.0\nalpha\n");
        run(&mut repo, &dir, "-rc1").unwrap();
        let second = run(&mut repo, &dir, "-rc1").unwrap();

        assert_eq!(second.skipped, vec!["alpha-rc1"]);
        assert!(second.pushed.is_empty());
        assert_eq!(second.up_to_date, vec!["alpha-rc1"]);
    }

    #[test]
    fn test_other_tag_errors_abort() {
        let (dir, mut repo) = setup("1.0.0\nalpha\nbeta\n");
        repo.fail_tag("alpha-rc1");
        assert!(run(&mut repo, &dir, "-rc1").is_err());
        assert!(repo.tag_names().is_empty());
        assert!(repo.push_log().is_empty());
    }

    #[test]
    fn test_push_failure_aborts_remaining_pushes() {
        let (dir, mut repo) = setup("1.0.0\nalpha\nbeta\ngamma\n");
        repo.fail_push("refs/tags/beta-rc1");
        assert!(run(&mut repo, &dir, "-rc1").is_err());

        assert_eq!(repo.tag_names().len(), 3);
        let pushed: Vec<_> = repo.push_log().iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(pushed, vec!["refs/tags/alpha-rc1"]);
    }

    #[test]
    fn test_empty_tag_file_is_noop() {
        let (dir, mut repo) = setup("# nothing yet\n\n1.2.3\n");
        let report = run(&mut repo, &dir, "-rc1").unwrap();
        assert!(report.created.is_empty());
        assert!(repo.push_log().is_empty());
        assert!(matches!(
            report.warnings.as_slice(),
            [BoundaryWarning::NoPendingTags { .. }]
        ));
    }
}
