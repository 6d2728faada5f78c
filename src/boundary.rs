use std::fmt;

/// Conditions the run tolerates but should report.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The tag was already present locally; creation was skipped
    TagAlreadyExists { tag: String },
    /// The remote already had this ref at the pushed commit
    AlreadyUpToDate { refname: String },
    /// More than one line matched the version-code pattern; only the first changed
    ExtraVersionCodeMatch { path: String, line: usize },
    /// The tag file had no pending tag names
    NoPendingTags { path: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::TagAlreadyExists { tag } => {
                write!(f, "Tag '{}' already exists locally, skipping", tag)
            }
            BoundaryWarning::AlreadyUpToDate { refname } => {
                write!(f, "Remote already up to date for {}", refname)
            }
            BoundaryWarning::ExtraVersionCodeMatch { path, line } => {
                write!(
                    f,
                    "{}:{} also matches the version code pattern and was left unchanged",
                    path, line
                )
            }
            BoundaryWarning::NoPendingTags { path } => {
                write!(f, "No pending tags in {}", path)
            }
        }
    }
}
