use crate::error::{ForgeError, Result};
use std::ops::Range;

/// The line of the version file that carries the build number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCodeLine<'a> {
    line: &'a str,
    digits: Range<usize>,
    code: u64,
}

impl<'a> VersionCodeLine<'a> {
    /// Read the first run of ASCII digits on the line as the version code.
    pub fn parse(line: &'a str) -> Result<Self> {
        let start = line
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ForgeError::parse(format!("No version code in line '{}'", line)))?;
        let len = line[start..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(line.len() - start);
        let digits = start..start + len;

        let code = line[digits.clone()].parse::<u64>().map_err(|e| {
            ForgeError::parse(format!(
                "Unable to parse version code '{}': {}",
                &line[digits.clone()],
                e
            ))
        })?;

        Ok(VersionCodeLine { line, digits, code })
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// The line with its digit run replaced by `code`.
    pub fn with_code(&self, code: u64) -> String {
        format!(
            "{}{}{}",
            &self.line[..self.digits.start],
            code,
            &self.line[self.digits.end..]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_replace() {
        let line = VersionCodeLine::parse("        versionCode 41 // build").unwrap();
        assert_eq!(line.code(), 41);
        assert_eq!(line.with_code(42), "        versionCode 42 // build");
    }

    #[test]
    fn test_only_first_digit_run_is_replaced() {
        let line = VersionCodeLine::parse("code=7 min=7").unwrap();
        assert_eq!(line.with_code(8), "code=8 min=7");
    }

    #[test]
    fn test_digits_at_end_of_line() {
        let line = VersionCodeLine::parse("BUILD=999").unwrap();
        assert_eq!(line.with_code(1000), "BUILD=1000");
    }

    #[test]
    fn test_missing_digits() {
        assert!(matches!(
            VersionCodeLine::parse("versionCode ="),
            Err(ForgeError::Parse(_))
        ));
    }

    #[test]
    fn test_overflow_is_parse_error() {
        assert!(matches!(
            VersionCodeLine::parse("versionCode 99999999999999999999999"),
            Err(ForgeError::Parse(_))
        ));
    }
}
