/// One line of a tag file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFileLine<'a> {
    /// Starts with `#` once leading whitespace is ignored
    Comment(&'a str),
    Blank,
    /// Trimmed content of an active line
    Entry(&'a str),
}

impl<'a> TagFileLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            TagFileLine::Blank
        } else if trimmed.starts_with('#') {
            TagFileLine::Comment(line)
        } else {
            TagFileLine::Entry(trimmed)
        }
    }

    pub fn entry(&self) -> Option<&'a str> {
        match self {
            TagFileLine::Entry(text) => Some(text),
            _ => None,
        }
    }
}

/// A pending tag: the base name from the tag file plus the configured suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub base: String,
    pub name: String,
}

impl Tag {
    pub fn with_suffix(base: impl Into<String>, suffix: &str) -> Self {
        let base = base.into();
        let name = format!("{}{}", base, suffix);
        Tag { base, name }
    }

    pub fn refname(&self) -> String {
        format!("refs/tags/{}", self.name)
    }
}

/// Active lines of a tag file, in file order.
pub fn active_entries(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter_map(|line| TagFileLine::classify(line).entry())
        .collect()
}
