use crate::error::{ForgeError, Result};
use crate::template::Value;
use regex::Regex;
use std::fmt;

/// Pattern for the version line of a tag file.
pub const SEMVER_PATTERN: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

/// Semantic version read from the first active line of a tag file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverEntry {
    version: semver::Version,
}

impl SemverEntry {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemverEntry {
            version: semver::Version::new(major, minor, patch),
        }
    }

    /// Extract `MAJOR.MINOR.PATCH` from a tag-file line.
    ///
    /// The first match on the line wins; anything around it is ignored.
    /// A missing match or a component that does not fit in a `u64` is a
    /// format error.
    pub fn parse_line(line: &str) -> Result<Self> {
        let re = Regex::new(SEMVER_PATTERN)
            .map_err(|e| ForgeError::parse(format!("Invalid semver pattern: {}", e)))?;
        let captures = re.captures(line).ok_or_else(|| {
            ForgeError::format(format!("'{}' does not contain MAJOR.MINOR.PATCH", line))
        })?;

        let component = |name: &str| -> Result<u64> {
            let digits = &captures[name];
            digits.parse::<u64>().map_err(|e| {
                ForgeError::format(format!("Invalid {} version '{}': {}", name, digits, e))
            })
        };

        Ok(SemverEntry::new(
            component("major")?,
            component("minor")?,
            component("patch")?,
        ))
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Template data: `.Major`, `.Minor`, `.Patch` and `.Version`.
    pub fn to_value(&self) -> Result<Value> {
        let int = |n: u64| {
            i64::try_from(n)
                .map(Value::Int)
                .map_err(|_| ForgeError::format(format!("Version component {} is too large", n)))
        };
        Ok(Value::map([
            ("Major", int(self.major())?),
            ("Minor", int(self.minor())?),
            ("Patch", int(self.patch())?),
            ("Version", Value::Str(self.version.to_string())),
        ]))
    }
}

/// True when the whole (trimmed) line is a bare `MAJOR.MINOR.PATCH`.
pub fn is_bare_semver(line: &str) -> bool {
    Regex::new(&format!("^{}$", SEMVER_PATTERN))
        .map(|re| re.is_match(line.trim()))
        .unwrap_or(false)
}

impl fmt::Display for SemverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
