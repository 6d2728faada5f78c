//! Git operations abstraction layer
//!
//! The release workflow only needs a handful of primitives: switch to a
//! branch, commit the working tree, fork a branch, tag HEAD and push a ref.
//! They are collected in the [Repository] trait so the workflow can run
//! against a real clone ([Git2Repository]) or an in-memory fake
//! ([MockRepository]).
//!
//! ```rust,no_run
//! # use release_forge::git::{Identity, Repository};
//! # fn example<R: Repository>(repo: &mut R) -> release_forge::Result<()> {
//! let identity = Identity::new("Bitrise", "bitrise@bitrise.io");
//! repo.checkout_branch("master")?;
//! repo.commit_all("[skip ci] Update Version Code", &identity)?;
//! repo.push("refs/heads/master")?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod mock;
pub mod repository;

pub use auth::Credentials;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::BranchName;
use crate::error::Result;
use git2::{Oid, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Fixed author and committer used for every commit and tag the run creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Signature stamped with the current time
    pub fn signature(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(&self.name, &self.email)?)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Outcome of a push that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// The remote ref moved or was created
    Updated,
    /// The remote already pointed at the same object
    UpToDate,
}

/// Repository primitives consumed by the release workflow
///
/// One run owns its repository exclusively, so mutating operations take
/// `&mut self`. Errors map to [crate::error::ForgeError]; a tag name that is
/// already taken must surface as `ForgeError::TagExists`.
pub trait Repository {
    /// Root of the working tree
    fn workdir(&self) -> &Path;

    /// Commit id HEAD currently resolves to
    fn head_oid(&self) -> Result<Oid>;

    /// Switch the working tree to a local branch, creating it from the
    /// remote-tracking branch when it only exists remotely.
    fn checkout_branch(&mut self, name: &str) -> Result<()>;

    /// Stage every change in the working tree and commit it on HEAD.
    fn commit_all(&mut self, message: &str, identity: &Identity) -> Result<Oid>;

    /// Create `name` at HEAD and make it the current branch.
    ///
    /// Fails if a branch of that name already exists.
    fn create_branch(&mut self, name: &BranchName) -> Result<()>;

    /// Commit on HEAD with the tree unchanged.
    fn commit_empty(&mut self, message: &str, identity: &Identity) -> Result<Oid>;

    /// Create an annotated tag at HEAD.
    ///
    /// # Returns
    /// * `Ok(Oid)` - Id of the tag object
    /// * `Err(ForgeError::TagExists)` - A tag with this name is already present
    fn create_tag(&mut self, name: &str, identity: &Identity) -> Result<Oid>;

    /// Push a fully qualified ref (`refs/heads/..` or `refs/tags/..`) to the
    /// same name on the remote.
    fn push(&mut self, refname: &str) -> Result<PushStatus>;
}
