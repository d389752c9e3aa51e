use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid field tag '{0}': expected a bracketed PubMed tag such as [tiab] or [tw]")]
pub struct FieldTagError(String);

/// A PubMed field-tag suffix, brackets included (`[tiab]`, `[tw]`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldTag(String);

impl FieldTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FieldTag {
    type Err = FieldTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| FieldTagError(s.to_string()))?;
        if inner.is_empty() || inner.contains(|c: char| c.is_whitespace() || c == '[' || c == ']') {
            return Err(FieldTagError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
