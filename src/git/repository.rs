use crate::domain::BranchName;
use crate::error::{ForgeError, Result};
use crate::git::{Credentials, Identity, PushStatus};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AutotagOption, BranchType, ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions,
    StatusOptions,
};
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: git2::Repository,
    workdir: PathBuf,
    remote: String,
    credentials: Credentials,
}

impl Git2Repository {
    /// Clone `url` into `path`, checking out `branch` and fetching all tags.
    ///
    /// The remote is registered under `remote` instead of libgit2's default
    /// `origin`.
    pub fn clone_branch(
        url: &str,
        path: &Path,
        branch: &str,
        remote: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        let remote_name = remote.to_string();
        let repo = {
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(credentials.remote_callbacks());
            fetch_options.download_tags(AutotagOption::All);

            RepoBuilder::new()
                .branch(branch)
                .fetch_options(fetch_options)
                .remote_create(move |repo, _name, url| repo.remote(&remote_name, url))
                .clone(url, path)
                .map_err(|e| ForgeError::remote(format!("Clone of {} failed: {}", url, e)))?
        };

        Self::from_git2(repo, remote, credentials)
    }

    /// Open an existing clone
    pub fn open<P: AsRef<Path>>(path: P, remote: &str, credentials: Credentials) -> Result<Self> {
        let repo = git2::Repository::open(path)?;
        Self::from_git2(repo, remote, credentials)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(
        repo: git2::Repository,
        remote: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| ForgeError::config("Bare repositories have no working tree"))?
            .to_path_buf();

        Ok(Git2Repository {
            repo,
            workdir,
            remote: remote.to_string(),
            credentials,
        })
    }

    /// Reuse the clone at `path` when there is one, otherwise clone afresh.
    ///
    /// A reused clone must have a clean working tree; its `branch` is then
    /// fetched and hard-reset to the remote, so every run starts from what
    /// the remote holds.
    pub fn open_or_clone(
        url: &str,
        path: &Path,
        branch: &str,
        remote: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        if path.join(".git").exists() {
            tracing::info!(path = %path.display(), "using existing clone");
            let repo = Self::open(path, remote, credentials)?;
            repo.ensure_clean()?;
            repo.reset_to_remote(branch)?;
            Ok(repo)
        } else {
            tracing::info!(%url, path = %path.display(), %branch, "cloning");
            Self::clone_branch(url, path, branch, remote, credentials)
        }
    }

    /// Fail when the working tree has staged, modified or untracked files.
    fn ensure_clean(&self) -> Result<()> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        if statuses.is_empty() {
            return Ok(());
        }

        let paths: Vec<String> = statuses
            .iter()
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();
        Err(ForgeError::config(format!(
            "Working tree at {} has uncommitted changes: {}",
            self.workdir.display(),
            paths.join(", ")
        )))
    }

    /// Fetch `branch` and point the local branch, HEAD and working tree at
    /// the remote's commit.
    fn reset_to_remote(&self, branch: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(&self.remote).map_err(|e| {
            ForgeError::remote(format!("Cannot find remote '{}': {}", self.remote, e))
        })?;
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.credentials.remote_callbacks());
        fetch_options.download_tags(AutotagOption::All);

        let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, self.remote);
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| ForgeError::remote(format!("Fetch of {} failed: {}", branch, e)))?;

        let tracking = format!("refs/remotes/{}/{}", self.remote, branch);
        let commit = self
            .repo
            .find_reference(&tracking)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| {
                ForgeError::remote(format!("Remote has no branch '{}': {}", branch, e))
            })?;

        let local = format!("refs/heads/{}", branch);
        self.repo
            .reference(&local, commit.id(), true, "reset to remote")?;
        self.repo.set_head(&local)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        tracing::info!(%branch, commit = %commit.id(), "reset to remote");
        Ok(())
    }

    /// Access the underlying git2 repository
    pub fn inner(&self) -> &git2::Repository {
        &self.repo
    }

    fn commit_tree_on_head(&self, tree_id: Oid, message: &str, identity: &Identity) -> Result<Oid> {
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let signature = identity.signature()?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        Ok(oid)
    }
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn head_oid(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    fn checkout_branch(&mut self, name: &str) -> Result<()> {
        if self.repo.find_branch(name, BranchType::Local).is_err() {
            let tracking = format!("{}/{}", self.remote, name);
            let commit = self
                .repo
                .find_reference(&format!("refs/remotes/{}", tracking))
                .and_then(|r| r.peel_to_commit())
                .map_err(|e| {
                    ForgeError::Git(git2::Error::from_str(&format!(
                        "Cannot find branch '{}': {}",
                        name, e
                    )))
                })?;
            let mut branch = self.repo.branch(name, &commit, false)?;
            branch.set_upstream(Some(tracking.as_str()))?;
        }

        let refname = format!("refs/heads/{}", name);
        let target = self.repo.revparse_single(&refname)?;
        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn commit_all(&mut self, message: &str, identity: &Identity) -> Result<Oid> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        self.commit_tree_on_head(tree_id, message, identity)
    }

    fn create_branch(&mut self, name: &BranchName) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name.as_str(), &head, false)?;
        // Same commit as before, so the working tree needs no checkout.
        self.repo.set_head(&name.refname())?;
        Ok(())
    }

    fn commit_empty(&mut self, message: &str, identity: &Identity) -> Result<Oid> {
        let tree_id = self.repo.head()?.peel_to_commit()?.tree_id();
        self.commit_tree_on_head(tree_id, message, identity)
    }

    fn create_tag(&mut self, name: &str, identity: &Identity) -> Result<Oid> {
        let head = self.repo.head()?.peel_to_commit()?;
        let signature = identity.signature()?;

        match self
            .repo
            .tag(name, head.as_object(), &signature, name, false)
        {
            Ok(oid) => Ok(oid),
            Err(e) if e.code() == ErrorCode::Exists => Err(ForgeError::TagExists(name.to_string())),
            Err(e) => Err(ForgeError::Git(e)),
        }
    }

    fn push(&mut self, refname: &str) -> Result<PushStatus> {
        let mut remote = self.repo.find_remote(&self.remote).map_err(|e| {
            ForgeError::remote(format!("Cannot find remote '{}': {}", self.remote, e))
        })?;

        let refspec = format!("{0}:{0}", refname);
        let mut changed = false;
        let mut rejected = None;
        {
            let mut callbacks = self.credentials.remote_callbacks();
            callbacks.push_negotiation(|updates| {
                changed = updates.iter().any(|update| update.src() != update.dst());
                Ok(())
            });
            callbacks.push_update_reference(|updated, status| {
                if let Some(status) = status {
                    rejected = Some(format!("{}: {}", updated, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(|e| {
                    if e.class() == git2::ErrorClass::Net {
                        ForgeError::remote(format!(
                            "Network error during push of {}: {}",
                            refname, e
                        ))
                    } else {
                        ForgeError::remote(format!("Failed to push {}: {}", refname, e))
                    }
                })?;
        }

        if let Some(reason) = rejected {
            return Err(ForgeError::remote(format!("Remote rejected {}", reason)));
        }

        if changed {
            Ok(PushStatus::Updated)
        } else {
            Ok(PushStatus::UpToDate)
        }
    }
}
