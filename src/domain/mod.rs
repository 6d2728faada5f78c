//! Domain logic - pure rules for version lines, tag files and branch names

pub mod branch;
pub mod tag;
pub mod version;
pub mod version_code;

pub use branch::BranchName;
pub use tag::{active_entries, Tag, TagFileLine};
pub use version::{is_bare_semver, SemverEntry, SEMVER_PATTERN};
pub use version_code::VersionCodeLine;
