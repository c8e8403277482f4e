//! Entity tags derived from an entity's version property.

use std::fmt;

/// An entity tag.
///
/// Holds the unquoted tag value, or nothing for [`ETag::NONE`], the sentinel
/// used when an entity has no version property or its version is null.
/// Two tags are equal when their unquoted values are equal; the sentinel
/// never matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ETag(Option<String>);

impl ETag {
    /// The "no ETag" sentinel.
    pub const NONE: ETag = ETag(None);

    /// Creates a tag from a raw value, stripping surrounding quotes and a
    /// weak-validator prefix.
    pub fn from_value(value: impl fmt::Display) -> Self {
        let raw = value.to_string();
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let unquoted = trimmed.trim_start_matches('"').trim_end_matches('"');
        Self(Some(unquoted.to_string()))
    }

    /// Creates a tag from an optional raw value; `None` yields [`ETag::NONE`].
    pub fn from_optional(value: Option<impl fmt::Display>) -> Self {
        value.map(Self::from_value).unwrap_or(Self::NONE)
    }

    /// Returns true for the "no ETag" sentinel.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the unquoted tag value.
    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Returns the quoted header value, or `None` for the sentinel.
    pub fn to_header_value(&self) -> Option<String> {
        self.0.as_ref().map(|v| format!("\"{v}\""))
    }

    /// Checks this tag against an `If-None-Match` / `If-Match` header value.
    ///
    /// The header may be `*` (matches any real tag) or a comma-separated list
    /// of tags. The sentinel never matches.
    pub fn matches_header(&self, header: &str) -> bool {
        if self.is_none() {
            return false;
        }
        let header = header.trim();
        if header == "*" {
            return true;
        }
        header
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .any(|candidate| Self::from_value(candidate) == *self)
    }
}

/// Renders the quoted form; the sentinel renders as an empty string.
impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "\"{v}\""),
            None => Ok(()),
        }
    }
}
