use crate::domain::BranchName;
use crate::error::{ForgeError, Result};
use crate::git::{Identity, PushStatus, Repository};
use git2::Oid;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A commit recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq)]
pub struct MockCommit {
    pub oid: Oid,
    pub branch: String,
    pub message: String,
    pub author: String,
}

/// Mock repository for testing without actual git operations
///
/// Files are read and written in a real directory (the mutators need one);
/// refs, commits, tags and the remote only exist in memory.
pub struct MockRepository {
    workdir: PathBuf,
    current: String,
    branches: BTreeMap<String, Oid>,
    tags: BTreeMap<String, Oid>,
    commits: Vec<MockCommit>,
    remote_refs: BTreeMap<String, Oid>,
    push_log: Vec<(String, PushStatus)>,
    failing_pushes: BTreeSet<String>,
    failing_tags: BTreeSet<String>,
    next_id: u64,
}

impl MockRepository {
    /// Create a mock with `trunk` holding one initial commit, already on the remote
    pub fn new(workdir: impl Into<PathBuf>, trunk: &str) -> Self {
        let mut repo = MockRepository {
            workdir: workdir.into(),
            current: trunk.to_string(),
            branches: BTreeMap::new(),
            tags: BTreeMap::new(),
            commits: Vec::new(),
            remote_refs: BTreeMap::new(),
            push_log: Vec::new(),
            failing_pushes: BTreeSet::new(),
            failing_tags: BTreeSet::new(),
            next_id: 0,
        };
        let initial = repo.allocate_oid();
        repo.branches.insert(trunk.to_string(), initial);
        repo.remote_refs
            .insert(format!("refs/heads/{}", trunk), initial);
        repo
    }

    /// Add a tag pointing at HEAD, as if it was fetched with the clone
    pub fn add_tag(&mut self, name: impl Into<String>) {
        let head = self.branches[&self.current];
        self.tags.insert(name.into(), head);
    }

    /// Make every push of `refname` fail
    pub fn fail_push(&mut self, refname: impl Into<String>) {
        self.failing_pushes.insert(refname.into());
    }

    /// Make creating tag `name` fail with a non-recoverable error
    pub fn fail_tag(&mut self, name: impl Into<String>) {
        self.failing_tags.insert(name.into());
    }

    pub fn current_branch(&self) -> &str {
        &self.current
    }

    pub fn branch_head(&self, name: &str) -> Option<Oid> {
        self.branches.get(name).copied()
    }

    pub fn commits(&self) -> &[MockCommit] {
        &self.commits
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// Ref names and statuses of every successful push, in order
    pub fn push_log(&self) -> &[(String, PushStatus)] {
        &self.push_log
    }

    /// What the fake remote holds for `refname`
    pub fn remote_ref(&self, refname: &str) -> Option<Oid> {
        self.remote_refs.get(refname).copied()
    }

    fn allocate_oid(&mut self) -> Oid {
        self.next_id += 1;
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&self.next_id.to_be_bytes());
        Oid::from_bytes(&bytes).unwrap_or_else(|_| Oid::zero())
    }

    fn record_commit(&mut self, message: &str, identity: &Identity) -> Oid {
        let oid = self.allocate_oid();
        self.branches.insert(self.current.clone(), oid);
        self.commits.push(MockCommit {
            oid,
            branch: self.current.clone(),
            message: message.to_string(),
            author: identity.to_string(),
        });
        oid
    }

    fn local_ref(&self, refname: &str) -> Option<Oid> {
        if let Some(branch) = refname.strip_prefix("refs/heads/") {
            self.branches.get(branch).copied()
        } else if let Some(tag) = refname.strip_prefix("refs/tags/") {
            self.tags.get(tag).copied()
        } else {
            None
        }
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn head_oid(&self) -> Result<Oid> {
        self.branches
            .get(&self.current)
            .copied()
            .ok_or_else(|| ForgeError::Git(git2::Error::from_str("HEAD is unborn")))
    }

    fn checkout_branch(&mut self, name: &str) -> Result<()> {
        if !self.branches.contains_key(name) {
            return Err(ForgeError::Git(git2::Error::from_str(&format!(
                "Cannot find branch '{}'",
                name
            ))));
        }
        self.current = name.to_string();
        Ok(())
    }

    fn commit_all(&mut self, message: &str, identity: &Identity) -> Result<Oid> {
        Ok(self.record_commit(message, identity))
    }

    fn create_branch(&mut self, name: &BranchName) -> Result<()> {
        if self.branches.contains_key(name.as_str()) {
            return Err(ForgeError::Git(git2::Error::from_str(&format!(
                "a reference called '{}' already exists",
                name.refname()
            ))));
        }
        let head = self.head_oid()?;
        self.branches.insert(name.as_str().to_string(), head);
        self.current = name.as_str().to_string();
        Ok(())
    }

    fn commit_empty(&mut self, message: &str, identity: &Identity) -> Result<Oid> {
        Ok(self.record_commit(message, identity))
    }

    fn create_tag(&mut self, name: &str, _identity: &Identity) -> Result<Oid> {
        if self.failing_tags.contains(name) {
            return Err(ForgeError::Git(git2::Error::from_str(&format!(
                "cannot create tag '{}'",
                name
            ))));
        }
        if self.tags.contains_key(name) {
            return Err(ForgeError::TagExists(name.to_string()));
        }
        let oid = self.allocate_oid();
        self.tags.insert(name.to_string(), oid);
        Ok(oid)
    }

    fn push(&mut self, refname: &str) -> Result<PushStatus> {
        if self.failing_pushes.contains(refname) {
            return Err(ForgeError::remote(format!("Failed to push {}: rejected", refname)));
        }
        let local = self
            .local_ref(refname)
            .ok_or_else(|| ForgeError::remote(format!("No such reference '{}'", refname)))?;

        let status = if self.remote_refs.get(refname) == Some(&local) {
            PushStatus::UpToDate
        } else {
            self.remote_refs.insert(refname.to_string(), local);
            PushStatus::Updated
        };
        self.push_log.push((refname.to_string(), status));
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("Bitrise", "bitrise@bitrise.io")
    }

    #[test]
    fn test_mock_repository_basic() {
        let repo = MockRepository::new("/tmp/work", "master");
        assert_eq!(repo.current_branch(), "master");
        assert_eq!(repo.workdir(), Path::new("/tmp/work"));
        assert_eq!(
            repo.remote_ref("refs/heads/master"),
            repo.branch_head("master")
        );
    }

    #[test]
    fn test_mock_repository_commits_move_branch() {
        let mut repo = MockRepository::new("/tmp/work", "master");
        let before = repo.head_oid().unwrap();
        let oid = repo.commit_all("bump", &identity()).unwrap();
        assert_ne!(before, oid);
        assert_eq!(repo.branch_head("master"), Some(oid));
        assert_eq!(repo.commits()[0].author, "Bitrise <bitrise@bitrise.io>");
    }

    #[test]
    fn test_mock_repository_push_status() {
        let mut repo = MockRepository::new("/tmp/work", "master");
        assert_eq!(repo.push("refs/heads/master").unwrap(), PushStatus::UpToDate);
        repo.commit_all("bump", &identity()).unwrap();
        assert_eq!(repo.push("refs/heads/master").unwrap(), PushStatus::Updated);
        assert!(repo.push("refs/heads/missing").is_err());
    }

    #[test]
    fn test_mock_repository_tags() {
        let mut repo = MockRepository::new("/tmp/work", "master");
        repo.add_tag("v1-rc1");
        assert!(repo
            .create_tag("v1-rc1", &identity())
            .unwrap_err()
            .is_tag_exists());
        repo.create_tag("v2-rc1", &identity()).unwrap();
        assert_eq!(repo.tag_names(), vec!["v1-rc1", "v2-rc1"]);
    }

    #[test]
    fn test_mock_repository_branches() {
        let mut repo = MockRepository::new("/tmp/work", "master");
        let branch = BranchName::new("release/w2").unwrap();
        repo.create_branch(&branch).unwrap();
        assert_eq!(repo.current_branch(), "release/w2");
        assert!(repo.create_branch(&branch).is_err());
        assert!(repo.checkout_branch("develop").is_err());
        repo.checkout_branch("master").unwrap();
        assert_eq!(repo.current_branch(), "master");
    }
}
