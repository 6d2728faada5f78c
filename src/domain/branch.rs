use crate::error::{ForgeError, Result};
use std::fmt;

/// Name of a release branch, checked against git's ref-name rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(String);

impl BranchName {
    /// Validate a rendered branch name. Surrounding whitespace is dropped.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ForgeError::parse("Branch name rendered empty"));
        }
        if !git2::Reference::is_valid_name(&format!("refs/heads/{}", name)) {
            return Err(ForgeError::parse(format!(
                "'{}' is not a valid branch name",
                name
            )));
        }
        Ok(BranchName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
